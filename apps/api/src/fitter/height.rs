//! Height estimation — predicts the rendered height of a résumé in mm.
//!
//! Uses greedy word wrapping against the template's `chars_per_line` and the
//! per-element constants from the catalog. Estimates deliberately round up:
//! overestimating forces one extra compression step, underestimating overflows
//! the page.

use crate::fitter::catalog::TemplateSpec;
use crate::render::schema::{RendererExperience, RendererResume};

/// Number of wrapped lines a text occupies at the given line width.
/// Greedy wrap on word boundaries; a word longer than the line hard-wraps.
pub fn estimate_text_lines(text: &str, chars_per_line: usize) -> usize {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }
    let width = chars_per_line.max(1);

    let mut lines = 1usize;
    let mut current = 0usize;
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > width {
            // Hard-wrap an oversized word across full lines.
            let needed = word_len.div_ceil(width);
            lines += needed;
            current = word_len % width;
            continue;
        }
        let sep = if current == 0 { 0 } else { 1 };
        if current + sep + word_len <= width {
            current += sep + word_len;
        } else {
            lines += 1;
            current = word_len;
        }
    }
    lines
}

/// Height of one experience block in its current format. Bullets beyond the
/// format's cap are not rendered and cost nothing.
pub fn estimate_experience_height(exp: &RendererExperience, spec: &TemplateSpec) -> f32 {
    let cap = exp.format.bullet_cap();
    let bullet_lines: usize = exp
        .bullets
        .iter()
        .take(cap)
        .map(|b| estimate_text_lines(b, spec.chars_per_line))
        .sum();
    spec.experience_header_mm + bullet_lines as f32 * spec.line_height_mm
}

fn skills_block_height(count: usize, spec: &TemplateSpec) -> f32 {
    if count == 0 {
        return 0.0;
    }
    let rows = count.div_ceil(spec.skills_per_row.max(1));
    spec.section_header_mm + rows as f32 * spec.skill_item_mm
}

/// Total estimated height of the rendered résumé for one template.
pub fn estimate_height(resume: &RendererResume, spec: &TemplateSpec) -> f32 {
    let mut header = spec.header_mm;
    if resume.profil.photo_url.is_some() {
        header += spec.photo_extra_mm;
    }

    let mut main = 0.0f32;

    let summary_lines = estimate_text_lines(&resume.profil.summary, spec.chars_per_line);
    if summary_lines > 0 {
        main += spec.section_header_mm + summary_lines as f32 * spec.line_height_mm;
    }

    if !resume.experiences.is_empty() {
        main += spec.section_header_mm;
        for exp in &resume.experiences {
            main += estimate_experience_height(exp, spec);
        }
    }

    if !resume.formations.is_empty() {
        main += spec.section_header_mm + resume.formations.len() as f32 * spec.formation_mm;
    }

    let mut side = skills_block_height(resume.competences.len(), spec);
    if !resume.langues.is_empty() {
        side += spec.section_header_mm + resume.langues.len() as f32 * spec.langue_mm;
    }

    if spec.sidebar {
        // Sidebar content runs beside the main column; the taller column wins.
        header + main.max(side)
    } else {
        header + main + side
    }
}

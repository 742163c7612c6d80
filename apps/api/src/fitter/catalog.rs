//! Template catalog — per-template spatial constants driving the height model.
//!
//! All dimensions are millimetres on the physical page. The constants are
//! calibrated against this repository's own HTML templates; they are
//! approximations, and the fitter's per-level re-estimation absorbs the
//! residual error the same way a safety margin would.

use serde::{Deserialize, Serialize};

/// Physical page format of the rendered PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageFormat {
    A4,
    Letter,
}

impl PageFormat {
    pub fn height_mm(self) -> f32 {
        match self {
            PageFormat::A4 => 297.0,
            PageFormat::Letter => 279.4,
        }
    }
}

/// Spatial constants for one template. Only ever built from the static tables
/// below, so it serializes but never deserializes.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateSpec {
    pub name: &'static str,
    pub page: PageFormat,
    pub margin_top_mm: f32,
    pub margin_bottom_mm: f32,
    /// Height of one wrapped text line at the template's base font size.
    pub line_height_mm: f32,
    /// Characters per line in the main column before wrapping.
    pub chars_per_line: usize,
    /// Identity block at the top (name, title, contacts).
    pub header_mm: f32,
    /// Extra header height when a photo is included.
    pub photo_extra_mm: f32,
    /// Height of a section title row.
    pub section_header_mm: f32,
    /// Role/company/date row of one experience.
    pub experience_header_mm: f32,
    /// One skill chip / list item.
    pub skill_item_mm: f32,
    /// How many skill items fit on one row (chip layouts pack several).
    pub skills_per_row: usize,
    pub formation_mm: f32,
    pub langue_mm: f32,
    /// True when skills/langues render in a sidebar beside the main column —
    /// their height then overlaps the experience column instead of adding.
    pub sidebar: bool,
    /// Profile fields this template never renders (loss-report material).
    pub omitted_fields: &'static [&'static str],
}

impl TemplateSpec {
    /// Usable vertical budget for a single page.
    pub fn page_budget_mm(&self) -> f32 {
        self.page.height_mm() - self.margin_top_mm - self.margin_bottom_mm
    }
}

static CLASSIC: TemplateSpec = TemplateSpec {
    name: "classic",
    page: PageFormat::A4,
    margin_top_mm: 18.0,
    margin_bottom_mm: 18.0,
    line_height_mm: 5.2,
    chars_per_line: 92,
    header_mm: 30.0,
    photo_extra_mm: 0.0, // classic never renders the photo
    section_header_mm: 9.0,
    experience_header_mm: 8.0,
    skill_item_mm: 5.2,
    skills_per_row: 4,
    formation_mm: 6.0,
    langue_mm: 5.2,
    sidebar: false,
    omitted_fields: &["photo_url", "linkedin"],
};

static MODERN: TemplateSpec = TemplateSpec {
    name: "modern",
    page: PageFormat::A4,
    margin_top_mm: 14.0,
    margin_bottom_mm: 14.0,
    line_height_mm: 4.8,
    chars_per_line: 98,
    header_mm: 34.0,
    photo_extra_mm: 8.0,
    section_header_mm: 8.0,
    experience_header_mm: 7.5,
    skill_item_mm: 5.0,
    skills_per_row: 5,
    formation_mm: 5.5,
    langue_mm: 5.0,
    sidebar: false,
    omitted_fields: &[],
};

static SIDEBAR: TemplateSpec = TemplateSpec {
    name: "sidebar",
    page: PageFormat::A4,
    margin_top_mm: 12.0,
    margin_bottom_mm: 12.0,
    line_height_mm: 5.0,
    chars_per_line: 64, // main column is narrower beside the sidebar
    header_mm: 26.0,
    photo_extra_mm: 10.0,
    section_header_mm: 8.5,
    experience_header_mm: 8.0,
    skill_item_mm: 5.0,
    skills_per_row: 1,
    formation_mm: 6.0,
    langue_mm: 5.0,
    sidebar: true,
    omitted_fields: &[],
};

static COMPACT_LETTER: TemplateSpec = TemplateSpec {
    name: "compact-letter",
    page: PageFormat::Letter,
    margin_top_mm: 12.0,
    margin_bottom_mm: 12.0,
    line_height_mm: 4.4,
    chars_per_line: 104,
    header_mm: 24.0,
    photo_extra_mm: 0.0,
    section_header_mm: 7.0,
    experience_header_mm: 6.5,
    skill_item_mm: 4.4,
    skills_per_row: 6,
    formation_mm: 5.0,
    langue_mm: 4.4,
    sidebar: false,
    omitted_fields: &["photo_url"],
};

static TEMPLATES: &[&TemplateSpec] = &[&CLASSIC, &MODERN, &SIDEBAR, &COMPACT_LETTER];

/// Looks up a template by name.
pub fn get_template(name: &str) -> Option<&'static TemplateSpec> {
    TEMPLATES.iter().copied().find(|t| t.name == name)
}

/// The template used when a request names none.
pub fn default_template() -> &'static TemplateSpec {
    &CLASSIC
}

pub fn template_names() -> Vec<&'static str> {
    TEMPLATES.iter().map(|t| t.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_template_by_name() {
        assert_eq!(get_template("classic").unwrap().name, "classic");
        assert_eq!(get_template("modern").unwrap().name, "modern");
        assert!(get_template("nonexistent").is_none());
    }

    #[test]
    fn test_template_spec_serializes_for_diagnostics() {
        let classic = get_template("classic").unwrap();
        let value = serde_json::to_value(classic).unwrap();
        assert_eq!(value["name"], "classic");
        assert_eq!(value["page"], "a4");
        assert_eq!(value["omitted_fields"][0], "photo_url");
    }

    #[test]
    fn test_page_budget_subtracts_margins() {
        let classic = get_template("classic").unwrap();
        assert!((classic.page_budget_mm() - (297.0 - 36.0)).abs() < 1e-3);
        let letter = get_template("compact-letter").unwrap();
        assert!((letter.page_budget_mm() - (279.4 - 24.0)).abs() < 1e-3);
    }

    #[test]
    fn test_classic_omits_photo_and_linkedin() {
        let classic = get_template("classic").unwrap();
        assert!(classic.omitted_fields.contains(&"photo_url"));
        assert!(classic.omitted_fields.contains(&"linkedin"));
    }

    #[test]
    fn test_all_budgets_positive_and_single_page() {
        for name in template_names() {
            let t = get_template(name).unwrap();
            assert!(t.page_budget_mm() > 200.0, "{name} budget too small");
            assert!(t.page_budget_mm() < 300.0, "{name} budget exceeds a page");
        }
    }
}

//! Export targets for the fitted résumé. Markdown is the universal fallback;
//! JSON is the machine-readable form the editor consumes.

use bytes::Bytes;

use crate::errors::AppError;
use crate::render::schema::RendererResume;

/// Renders the résumé as Markdown.
pub fn export_markdown(resume: &RendererResume) -> Bytes {
    let mut out = String::new();

    if !resume.profil.name.is_empty() {
        out.push_str(&format!("# {}\n", resume.profil.name));
    }
    if !resume.profil.title.is_empty() {
        out.push_str(&format!("**{}**\n", resume.profil.title));
    }

    let contacts: Vec<&str> = [
        resume.profil.email.as_deref(),
        resume.profil.phone.as_deref(),
        resume.profil.location.as_deref(),
        resume.profil.linkedin.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !contacts.is_empty() {
        out.push_str(&format!("\n{}\n", contacts.join(" · ")));
    }

    if !resume.profil.summary.is_empty() {
        out.push_str(&format!("\n{}\n", resume.profil.summary));
    }

    if !resume.experiences.is_empty() {
        out.push_str("\n## Expériences\n");
        for exp in &resume.experiences {
            out.push('\n');
            match (&exp.company, &exp.period) {
                (c, Some(p)) if !c.is_empty() => {
                    out.push_str(&format!("### {} — {} ({})\n", exp.role, c, p));
                }
                (c, None) if !c.is_empty() => {
                    out.push_str(&format!("### {} — {}\n", exp.role, c));
                }
                (_, Some(p)) => out.push_str(&format!("### {} ({})\n", exp.role, p)),
                _ => out.push_str(&format!("### {}\n", exp.role)),
            }
            for bullet in exp.bullets.iter().take(exp.format.bullet_cap()) {
                out.push_str(&format!("- {bullet}\n"));
            }
        }
    }

    if !resume.competences.is_empty() {
        out.push_str("\n## Compétences\n\n");
        out.push_str(&resume.competences.join(" · "));
        out.push('\n');
    }

    if !resume.formations.is_empty() {
        out.push_str("\n## Formation\n\n");
        for f in &resume.formations {
            out.push_str(&format!("- {f}\n"));
        }
    }

    if !resume.langues.is_empty() {
        out.push_str("\n## Langues\n\n");
        for (lang, level) in &resume.langues {
            out.push_str(&format!("- {lang} : {level}\n"));
        }
    }

    Bytes::from(out)
}

/// Serializes the résumé as pretty-printed JSON.
pub fn export_json(resume: &RendererResume) -> Result<Bytes, AppError> {
    let json = serde_json::to_vec_pretty(resume)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("resume serialization failed: {e}")))?;
    Ok(Bytes::from(json))
}

//! Snapshot comparison between the live document and the last saved baseline.
//!
//! Every field is compared explicitly by type. The photo is compared by
//! content digest, so reloading the same file into a fresh buffer never
//! marks the document dirty.

use serde::Serialize;

use crate::models::{Photo, ResumeContent, ResumeDocument};

/// Names of the document fields, as reported by [`changed_fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeField {
    Title,
    Description,
    ColorHex,
    BorderStyle,
    FirstName,
    LastName,
    JobTitle,
    City,
    Country,
    Phone,
    Email,
    Summary,
    WorkExperiences,
    Educations,
    Skills,
    Photo,
}

/// True when `current` differs from `baseline` in any field.
pub fn is_dirty(current: &ResumeDocument, baseline: &ResumeDocument) -> bool {
    !changed_fields(current, baseline).is_empty()
}

/// True when the photo of `current` carries the same content as `baseline`'s.
pub fn photo_unchanged(current: &ResumeDocument, baseline: &ResumeDocument) -> bool {
    photos_equal(&current.photo, &baseline.photo)
}

/// Lists every field whose value differs, in declaration order.
pub fn changed_fields(current: &ResumeDocument, baseline: &ResumeDocument) -> Vec<ResumeField> {
    let mut changed = scalar_changes(&current.content, &baseline.content);

    let (cur, base) = (&current.content, &baseline.content);
    if cur.work_experiences != base.work_experiences {
        changed.push(ResumeField::WorkExperiences);
    }
    if cur.educations != base.educations {
        changed.push(ResumeField::Educations);
    }
    if cur.skills != base.skills {
        changed.push(ResumeField::Skills);
    }
    if !photo_unchanged(current, baseline) {
        changed.push(ResumeField::Photo);
    }
    changed
}

fn scalar_changes(current: &ResumeContent, baseline: &ResumeContent) -> Vec<ResumeField> {
    let pairs = [
        (ResumeField::Title, &current.title, &baseline.title),
        (ResumeField::Description, &current.description, &baseline.description),
        (ResumeField::ColorHex, &current.color_hex, &baseline.color_hex),
        (ResumeField::BorderStyle, &current.border_style, &baseline.border_style),
        (ResumeField::FirstName, &current.first_name, &baseline.first_name),
        (ResumeField::LastName, &current.last_name, &baseline.last_name),
        (ResumeField::JobTitle, &current.job_title, &baseline.job_title),
        (ResumeField::City, &current.city, &baseline.city),
        (ResumeField::Country, &current.country, &baseline.country),
        (ResumeField::Phone, &current.phone, &baseline.phone),
        (ResumeField::Email, &current.email, &baseline.email),
        (ResumeField::Summary, &current.summary, &baseline.summary),
    ];

    pairs
        .into_iter()
        .filter(|(_, cur, base)| cur != base)
        .map(|(field, _, _)| field)
        .collect()
}

fn photos_equal(current: &Photo, baseline: &Photo) -> bool {
    match (current, baseline) {
        (Photo::Unchanged, Photo::Unchanged) | (Photo::Removed, Photo::Removed) => true,
        (Photo::Upload(a), Photo::Upload(b)) => a.same_content(b),
        _ => false,
    }
}

// Note operations. Every operation builds fresh collections and hands them back to the
// record through its setters, so the lists of other clones are never touched.

use uuid::Uuid;

use crate::model::{CirculationNote, CirculationNoteType, Note, NoteBearing};
use crate::notes::category::NoteCategory;
use crate::processor::error::RuleError;

/// Set or clear the staff-only flag on every note of `category`
pub fn mark_staff_only<T: NoteBearing>(
    record: &mut T,
    category: &NoteCategory,
    staff_only: bool,
) -> Result<(), RuleError> {
    match category {
        NoteCategory::Administrative => Err(RuleError::validation(
            "Administrative notes cannot be marked as staff only",
        )),
        NoteCategory::Typed(type_id) => {
            let notes = record
                .typed_notes()
                .iter()
                .map(|note| {
                    if note.has_type(type_id) {
                        Note { staff_only, ..note.clone() }
                    } else {
                        note.clone()
                    }
                })
                .collect();
            record.set_typed_notes(notes);
            Ok(())
        }
        NoteCategory::Circulation(note_type) => {
            ensure_circulation(record)?;
            let notes = record
                .circulation_notes()
                .iter()
                .map(|note| {
                    if note.note_type == *note_type {
                        CirculationNote { staff_only, ..note.clone() }
                    } else {
                        note.clone()
                    }
                })
                .collect();
            record.set_circulation_notes(notes);
            Ok(())
        }
    }
}

/// Drop every note of `category`
pub fn remove_all<T: NoteBearing>(record: &mut T, category: &NoteCategory) -> Result<(), RuleError> {
    match category {
        NoteCategory::Administrative => record.set_administrative_notes(Vec::new()),
        NoteCategory::Typed(type_id) => {
            let notes = record
                .typed_notes()
                .iter()
                .filter(|note| !note.has_type(type_id))
                .cloned()
                .collect();
            record.set_typed_notes(notes);
        }
        NoteCategory::Circulation(note_type) => {
            ensure_circulation(record)?;
            let notes = record
                .circulation_notes()
                .iter()
                .filter(|note| note.note_type != *note_type)
                .cloned()
                .collect();
            record.set_circulation_notes(notes);
        }
    }
    Ok(())
}

/// Append a new note of `category`
pub fn add<T: NoteBearing>(
    record: &mut T,
    category: &NoteCategory,
    text: &str,
    staff_only: bool,
) -> Result<(), RuleError> {
    match category {
        NoteCategory::Administrative => {
            let mut notes = record.administrative_notes().to_vec();
            notes.push(text.to_string());
            record.set_administrative_notes(notes);
        }
        NoteCategory::Typed(type_id) => {
            let mut notes = record.typed_notes().to_vec();
            notes.push(Note::new(type_id.clone(), text).staff_only(staff_only));
            record.set_typed_notes(notes);
        }
        NoteCategory::Circulation(note_type) => {
            ensure_circulation(record)?;
            let mut notes = record.circulation_notes().to_vec();
            let mut note = CirculationNote::new(*note_type, text);
            note.staff_only = staff_only;
            notes.push(note);
            record.set_circulation_notes(notes);
        }
    }
    Ok(())
}

/// Remove `find` from the text of every note of `category`; notes left blank are dropped
pub fn find_and_remove<T: NoteBearing>(
    record: &mut T,
    category: &NoteCategory,
    find: &str,
) -> Result<(), RuleError> {
    edit_text(record, category, |text| {
        let remaining = text.replace(find, "");
        if remaining.trim().is_empty() {
            None
        } else {
            Some(remaining)
        }
    })
}

/// Replace `find` with `replacement` in every note of `category`
pub fn find_and_replace<T: NoteBearing>(
    record: &mut T,
    category: &NoteCategory,
    find: &str,
    replacement: &str,
) -> Result<(), RuleError> {
    edit_text(record, category, |text| Some(text.replace(find, replacement)))
}

/// Move every note of `from` into `to`.
///
/// Administrative notes carry no type or staff-only metadata: moving into the
/// administrative list keeps the text only, and moving out of it wraps the text in
/// a new note that is not staff only. Moves within the same physical list keep
/// each note's position.
pub fn change_type<T: NoteBearing>(
    record: &mut T,
    from: &NoteCategory,
    to: &NoteCategory,
) -> Result<(), RuleError> {
    if from == to {
        return Ok(());
    }
    if matches!(from, NoteCategory::Circulation(_)) || matches!(to, NoteCategory::Circulation(_)) {
        ensure_circulation(record)?;
    }

    match (from, to) {
        (NoteCategory::Typed(source), NoteCategory::Typed(destination)) => {
            let notes = record
                .typed_notes()
                .iter()
                .map(|note| {
                    if note.has_type(source) {
                        Note {
                            note_type_id: Some(destination.clone()),
                            ..note.clone()
                        }
                    } else {
                        note.clone()
                    }
                })
                .collect();
            record.set_typed_notes(notes);
            return Ok(());
        }
        (NoteCategory::Circulation(source), NoteCategory::Circulation(destination)) => {
            let notes = record
                .circulation_notes()
                .iter()
                .map(|note| {
                    if note.note_type == *source {
                        CirculationNote {
                            note_type: *destination,
                            ..note.clone()
                        }
                    } else {
                        note.clone()
                    }
                })
                .collect();
            record.set_circulation_notes(notes);
            return Ok(());
        }
        _ => {}
    }

    let mut administrative = record.administrative_notes().to_vec();
    let mut typed = record.typed_notes().to_vec();
    let mut circulation = record.circulation_notes().to_vec();

    let moved: Vec<MovedNote> = match from {
        NoteCategory::Administrative => administrative
            .drain(..)
            .map(|text| MovedNote { text, staff_only: false, tenant_id: None })
            .collect(),
        NoteCategory::Typed(type_id) => {
            let (moved, kept): (Vec<Note>, Vec<Note>) =
                typed.into_iter().partition(|note| note.has_type(type_id));
            typed = kept;
            moved
                .into_iter()
                .map(|note| MovedNote {
                    text: note.note,
                    staff_only: note.staff_only,
                    tenant_id: note.tenant_id,
                })
                .collect()
        }
        NoteCategory::Circulation(note_type) => {
            let (moved, kept): (Vec<CirculationNote>, Vec<CirculationNote>) =
                circulation.into_iter().partition(|note| note.note_type == *note_type);
            circulation = kept;
            moved
                .into_iter()
                .map(|note| MovedNote {
                    text: note.note,
                    staff_only: note.staff_only,
                    tenant_id: None,
                })
                .collect()
        }
    };

    tracing::trace!("Moving {} notes from {} to {}", moved.len(), from, to);

    match to {
        NoteCategory::Administrative => {
            administrative.extend(moved.into_iter().map(|note| note.text));
        }
        NoteCategory::Typed(type_id) => {
            typed.extend(moved.into_iter().map(|note| Note {
                note_type_id: Some(type_id.clone()),
                note: note.text,
                staff_only: note.staff_only,
                tenant_id: note.tenant_id,
            }));
        }
        NoteCategory::Circulation(note_type) => {
            circulation.extend(moved.into_iter().map(|note| CirculationNote {
                id: Some(Uuid::new_v4().to_string()),
                note_type: *note_type,
                note: note.text,
                staff_only: note.staff_only,
            }));
        }
    }

    record.set_administrative_notes(administrative);
    record.set_typed_notes(typed);
    if record.supports_circulation_notes() {
        record.set_circulation_notes(circulation);
    }
    Ok(())
}

/// Copy every circulation note of `from` into the opposite sub-type under a new id
pub fn duplicate<T: NoteBearing>(record: &mut T, from: CirculationNoteType) -> Result<(), RuleError> {
    ensure_circulation(record)?;
    let mut notes = record.circulation_notes().to_vec();
    let copies: Vec<CirculationNote> = notes
        .iter()
        .filter(|note| note.note_type == from)
        .map(|note| CirculationNote {
            id: Some(Uuid::new_v4().to_string()),
            note_type: from.opposite(),
            ..note.clone()
        })
        .collect();
    notes.extend(copies);
    record.set_circulation_notes(notes);
    Ok(())
}

/// Number of notes currently in `category`
pub fn count<T: NoteBearing>(record: &T, category: &NoteCategory) -> usize {
    match category {
        NoteCategory::Administrative => record.administrative_notes().len(),
        NoteCategory::Typed(type_id) => record
            .typed_notes()
            .iter()
            .filter(|note| note.has_type(type_id))
            .count(),
        NoteCategory::Circulation(note_type) => record
            .circulation_notes()
            .iter()
            .filter(|note| note.note_type == *note_type)
            .count(),
    }
}

struct MovedNote {
    text: String,
    staff_only: bool,
    tenant_id: Option<String>,
}

fn ensure_circulation<T: NoteBearing>(record: &T) -> Result<(), RuleError> {
    if record.supports_circulation_notes() {
        Ok(())
    } else {
        Err(RuleError::validation("Record type has no circulation notes"))
    }
}

/// Rewrite the text of every note in `category`; `None` drops the note
fn edit_text<T, F>(record: &mut T, category: &NoteCategory, edit: F) -> Result<(), RuleError>
where
    T: NoteBearing,
    F: Fn(&str) -> Option<String>,
{
    match category {
        NoteCategory::Administrative => {
            let notes = record
                .administrative_notes()
                .iter()
                .filter_map(|text| edit(text))
                .collect();
            record.set_administrative_notes(notes);
        }
        NoteCategory::Typed(type_id) => {
            let notes = record
                .typed_notes()
                .iter()
                .filter_map(|note| {
                    if note.has_type(type_id) {
                        edit(&note.note).map(|text| Note { note: text, ..note.clone() })
                    } else {
                        Some(note.clone())
                    }
                })
                .collect();
            record.set_typed_notes(notes);
        }
        NoteCategory::Circulation(note_type) => {
            ensure_circulation(record)?;
            let notes = record
                .circulation_notes()
                .iter()
                .filter_map(|note| {
                    if note.note_type == *note_type {
                        edit(&note.note).map(|text| CirculationNote { note: text, ..note.clone() })
                    } else {
                        Some(note.clone())
                    }
                })
                .collect();
            record.set_circulation_notes(notes);
        }
    }
    Ok(())
}

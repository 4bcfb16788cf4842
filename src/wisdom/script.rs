use crate::wisdom::WisdomRecord;

/// The narration read aloud for a teaching.
pub fn speech_script(record: &WisdomRecord) -> String {
    format!(
        "The concept is {}. {}. {}. Wisdom says: {}. Practice this today: {}. Your affirmation: {}.",
        record.term, record.translation, record.definition, record.wisdom, record.application, record.affirmation
    )
}

/// Plain text offered when the user shares the teaching.
pub fn share_text(record: &WisdomRecord) -> String {
    format!(
        "Dharma Daily: {}\n\"{}\"\nAffirmation: {}",
        record.term, record.wisdom, record.affirmation
    )
}

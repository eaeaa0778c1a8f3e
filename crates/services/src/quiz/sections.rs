use study_core::model::Section;

/// One row of the section-list view: stored/derived progress plus the
/// unlock flag recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOverview {
    pub section: Section,
    pub completed_questions: u32,
    pub is_completed: bool,
    pub is_unlocked: bool,
}

/// Unlock chain over completion flags, in section order: the first section is
/// always unlocked; each later one unlocks iff its predecessor is complete.
#[must_use]
pub(crate) fn unlocked_flags(completed: &[bool]) -> Vec<bool> {
    let mut unlocked = Vec::with_capacity(completed.len());
    let mut previous_complete = true;
    for &is_complete in completed {
        unlocked.push(previous_complete);
        previous_complete = is_complete;
    }
    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_section_is_always_unlocked() {
        assert_eq!(unlocked_flags(&[false]), vec![true]);
        assert_eq!(unlocked_flags(&[false, false]), vec![true, false]);
    }

    #[test]
    fn completion_unlocks_the_next_section_only() {
        assert_eq!(
            unlocked_flags(&[true, false, false]),
            vec![true, true, false]
        );
        assert_eq!(unlocked_flags(&[true, true, false]), vec![true, true, true]);
    }

    #[test]
    fn a_gap_blocks_everything_after_it() {
        assert_eq!(
            unlocked_flags(&[true, false, true]),
            vec![true, true, false]
        );
    }
}

//! Exercise attachment.
//!
//! After matching, every slot gets the practicals attached to its lectures,
//! minus the rule denylist, plus any manual additions.

use tracing::{debug, trace};

use crate::curriculum::SelectionRules;
use crate::source::OfferingTable;

use super::selection::{Selected, Selection};

/// Append attached practicals to every slot of the selection.
pub fn attach_practicals(
    selection: &mut Selection,
    table: &OfferingTable,
    rules: &SelectionRules,
) {
    let track = selection.track;
    let Some(profile) = rules.profile(track) else {
        return;
    };

    let mut attached = 0usize;
    for (semester, chosen) in selection.semesters.iter_mut() {
        for (study_semester, slot) in chosen.slots.iter_mut() {
            let parents = slot.parent_keys();
            let candidates =
                table.practicals_for(*semester, &parents, &profile.practical_excluded_types);
            let keys = slot.keys();

            for practical in candidates {
                if rules.is_denied_practical(track, *semester, &practical.title, &keys) {
                    trace!(key = %practical.key, %semester, "practical denied");
                    continue;
                }
                if slot.push(Selected::Practical(practical.key.clone())) {
                    trace!(key = %practical.key, %semester, %study_semester, "practical attached");
                    attached += 1;
                }
            }
        }
    }

    for extra in rules.extra_practicals(track) {
        let slot = selection
            .semesters
            .get_mut(&extra.semester)
            .and_then(|chosen| chosen.slots.get_mut(&extra.study_semester));
        if let Some(slot) = slot
            && slot.push(Selected::Practical(extra.key.clone()))
        {
            attached += 1;
        }
    }

    debug!(%track, attached, "practicals attached");
}

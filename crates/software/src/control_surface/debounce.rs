use crate::time_base::Micros;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Levels {
    /// The level last reported.
    stable: bool,
    /// The most recent raw level.
    candidate: bool,
    /// When the raw level last changed.
    since: Micros,
}

/// Debounce filter for a single button or switch.
///
/// A transition is only reported once the raw level has held still for the whole hold interval. Each channel owns its
/// own filter, so bouncing on one input never shifts another input's timing. The first sample seeds the stable level
/// without being reported.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Debouncer {
    levels: Option<Levels>,
}

impl Debouncer {
    /// Feeds a raw sample taken at `now`, returning the new stable level if a transition was confirmed.
    pub fn update(&mut self, level: bool, now: Micros, hold: u32) -> Option<bool> {
        let Some(levels) = self.levels.as_mut() else {
            self.levels = Some(Levels {
                stable: level,
                candidate: level,
                since: now,
            });
            return None;
        };

        if level != levels.candidate {
            levels.candidate = level;
            levels.since = now;
        }

        if levels.candidate != levels.stable && now.has_elapsed(levels.since, hold) {
            levels.stable = levels.candidate;
            Some(levels.stable)
        } else {
            None
        }
    }
}

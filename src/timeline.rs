//! Intro sequence: a fixed table of timed stage transitions.
//!
//! The sequencer itself is pure: callers feed it the elapsed time since
//! mount and it reports which stages fired. The browser layer owns the
//! actual timers and drops them all when the page is torn down.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::INTRO_WORDS;

/// Discrete step of the intro animation, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SequenceStage {
    Closed,
    BarsOpen,
    WordA,
    WordB,
    WordC,
    TextHidden,
    ModelVisible,
}

impl SequenceStage {
    pub const ALL: [SequenceStage; 7] = [
        Self::Closed,
        Self::BarsOpen,
        Self::WordA,
        Self::WordB,
        Self::WordC,
        Self::TextHidden,
        Self::ModelVisible,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::BarsOpen => "bars-open",
            Self::WordA => "word-a",
            Self::WordB => "word-b",
            Self::WordC => "word-c",
            Self::TextHidden => "text-hidden",
            Self::ModelVisible => "model-visible",
        }
    }

    /// Stage that directly follows this one, if any.
    pub fn next(self) -> Option<Self> {
        let index = Self::ALL.iter().position(|stage| *stage == self)?;
        Self::ALL.get(index + 1).copied()
    }
}

impl fmt::Display for SequenceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("schedule entry {index} at {at_ms}ms does not come after {previous_ms}ms")]
    TimeNotIncreasing {
        index: usize,
        at_ms: u32,
        previous_ms: u32,
    },
    #[error("schedule entry {index} moves from {from} to {to}; stages must advance one step at a time")]
    StageOutOfOrder {
        index: usize,
        from: SequenceStage,
        to: SequenceStage,
    },
}

/// One row of the schedule: at `at_ms` after mount, enter `stage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub at_ms: u32,
    pub stage: SequenceStage,
}

/// Validated transition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ScheduleEntry>", into = "Vec<ScheduleEntry>")]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    /// Builds a schedule, rejecting tables that skip stages or go back in time.
    pub fn new(entries: Vec<ScheduleEntry>) -> Result<Self, ScheduleError> {
        let mut previous_ms = 0;
        let mut stage = SequenceStage::Closed;
        for (index, entry) in entries.iter().enumerate() {
            if index > 0 && entry.at_ms <= previous_ms {
                return Err(ScheduleError::TimeNotIncreasing {
                    index,
                    at_ms: entry.at_ms,
                    previous_ms,
                });
            }
            if stage.next() != Some(entry.stage) {
                return Err(ScheduleError::StageOutOfOrder {
                    index,
                    from: stage,
                    to: entry.stage,
                });
            }
            previous_ms = entry.at_ms;
            stage = entry.stage;
        }
        Ok(Self { entries })
    }

    /// The landing page intro.
    pub fn intro() -> Self {
        use SequenceStage::*;
        Self {
            entries: vec![
                ScheduleEntry { at_ms: 250, stage: BarsOpen },
                ScheduleEntry { at_ms: 1800, stage: WordA },
                ScheduleEntry { at_ms: 2500, stage: WordB },
                ScheduleEntry { at_ms: 3500, stage: WordC },
                ScheduleEntry { at_ms: 4500, stage: TextHidden },
                // 800ms after the text starts fading, matching its transition.
                ScheduleEntry { at_ms: 5300, stage: ModelVisible },
            ],
        }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }
}

impl TryFrom<Vec<ScheduleEntry>> for Schedule {
    type Error = ScheduleError;

    fn try_from(entries: Vec<ScheduleEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<Schedule> for Vec<ScheduleEntry> {
    fn from(schedule: Schedule) -> Self {
        schedule.entries
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::intro()
    }
}

/// Consumes a [`Schedule`] against elapsed time.
#[derive(Debug, Clone)]
pub struct IntroSequencer {
    schedule: Schedule,
    cursor: usize,
    stage: SequenceStage,
    cancelled: bool,
}

impl IntroSequencer {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            cursor: 0,
            stage: SequenceStage::Closed,
            cancelled: false,
        }
    }

    pub fn stage(&self) -> SequenceStage {
        self.stage
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_finished(&self) -> bool {
        self.cancelled || self.cursor >= self.schedule.entries.len()
    }

    /// Fires every entry due by `elapsed_ms`, oldest first. Each entry fires once.
    pub fn advance_to(&mut self, elapsed_ms: u32) -> Vec<SequenceStage> {
        let mut fired = Vec::new();
        if self.cancelled {
            return fired;
        }
        while let Some(entry) = self.schedule.entries.get(self.cursor) {
            if entry.at_ms > elapsed_ms {
                break;
            }
            self.stage = entry.stage;
            self.cursor += 1;
            log::debug!("intro stage -> {} at {}ms", entry.stage, entry.at_ms);
            fired.push(entry.stage);
        }
        fired
    }

    /// Elapsed time at which the next pending entry fires.
    pub fn next_deadline(&self) -> Option<u32> {
        if self.cancelled {
            return None;
        }
        self.schedule.entries.get(self.cursor).map(|entry| entry.at_ms)
    }

    /// Drops every pending transition.
    pub fn cancel(&mut self) {
        if !self.cancelled && !self.is_finished() {
            log::debug!(
                "intro cancelled at {} with {} pending transition(s)",
                self.stage,
                self.schedule.entries.len() - self.cursor
            );
        }
        self.cancelled = true;
    }
}

impl Default for IntroSequencer {
    fn default() -> Self {
        Self::new(Schedule::intro())
    }
}

/// What the hero section shows for a given stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntroView {
    pub bars_open: bool,
    pub text_visible: bool,
    pub word: Option<&'static str>,
    pub model_visible: bool,
    pub marquee_visible: bool,
}

impl IntroView {
    pub fn for_stage(stage: SequenceStage) -> Self {
        use SequenceStage::*;
        let word = match stage {
            Closed | BarsOpen | WordA => Some(INTRO_WORDS[0]),
            WordB => Some(INTRO_WORDS[1]),
            WordC | TextHidden => Some(INTRO_WORDS[2]),
            ModelVisible => None,
        };
        Self {
            bars_open: stage >= BarsOpen,
            text_visible: matches!(stage, WordA | WordB | WordC),
            word,
            model_visible: stage >= ModelVisible,
            marquee_visible: stage >= ModelVisible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SequenceStage::*;

    #[test]
    fn fires_in_table_order_without_skips() {
        let mut sequencer = IntroSequencer::default();
        let mut seen = vec![sequencer.stage()];
        for t in (0..=6000).step_by(50) {
            seen.extend(sequencer.advance_to(t));
        }
        assert_eq!(seen, SequenceStage::ALL.to_vec());
        assert!(sequencer.is_finished());
    }

    #[test]
    fn stages_change_exactly_at_their_deadlines() {
        let mut sequencer = IntroSequencer::default();
        assert!(sequencer.advance_to(249).is_empty());
        assert_eq!(sequencer.stage(), Closed);
        assert_eq!(sequencer.advance_to(250), vec![BarsOpen]);
        assert!(sequencer.advance_to(1799).is_empty());
        assert_eq!(sequencer.advance_to(1800), vec![WordA]);
        assert_eq!(sequencer.next_deadline(), Some(2500));
    }

    #[test]
    fn late_tick_fires_all_due_entries_once() {
        let mut sequencer = IntroSequencer::default();
        assert_eq!(sequencer.advance_to(3600), vec![BarsOpen, WordA, WordB, WordC]);
        assert!(sequencer.advance_to(3600).is_empty());
        assert_eq!(sequencer.stage(), WordC);
    }

    #[test]
    fn cancel_stops_pending_transitions() {
        let mut sequencer = IntroSequencer::default();
        sequencer.advance_to(300);
        sequencer.cancel();
        assert!(sequencer.advance_to(10_000).is_empty());
        assert_eq!(sequencer.stage(), BarsOpen);
        assert_eq!(sequencer.next_deadline(), None);
    }

    #[test]
    fn rejects_backward_or_skipping_tables() {
        let skip = Schedule::new(vec![
            ScheduleEntry { at_ms: 100, stage: BarsOpen },
            ScheduleEntry { at_ms: 200, stage: WordB },
        ]);
        assert!(matches!(skip, Err(ScheduleError::StageOutOfOrder { index: 1, .. })));

        let backwards = Schedule::new(vec![
            ScheduleEntry { at_ms: 100, stage: BarsOpen },
            ScheduleEntry { at_ms: 100, stage: WordA },
        ]);
        assert!(matches!(backwards, Err(ScheduleError::TimeNotIncreasing { index: 1, .. })));
    }

    #[test]
    fn intro_table_passes_validation() {
        let intro = Schedule::intro();
        assert_eq!(Schedule::new(intro.entries().to_vec()), Ok(intro));
    }

    #[test]
    fn deserialized_tables_are_validated() {
        let json = serde_json::to_string(&Schedule::intro()).unwrap();
        let parsed: Schedule = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Schedule::intro());

        let backwards = r#"[{"at_ms":500,"stage":"BarsOpen"},{"at_ms":100,"stage":"WordA"}]"#;
        let err = serde_json::from_str::<Schedule>(backwards).unwrap_err();
        assert!(err.to_string().contains("does not come after"));

        let skipping = r#"[{"at_ms":100,"stage":"WordA"}]"#;
        assert!(serde_json::from_str::<Schedule>(skipping).is_err());
    }

    #[test]
    fn view_follows_stage() {
        let closed = IntroView::for_stage(Closed);
        assert!(!closed.bars_open && !closed.text_visible && !closed.model_visible);

        assert_eq!(IntroView::for_stage(WordA).word, Some("smart"));
        assert_eq!(IntroView::for_stage(WordB).word, Some("bold"));
        assert_eq!(IntroView::for_stage(WordC).word, Some("connected"));
        assert!(!IntroView::for_stage(TextHidden).text_visible);

        let shown = IntroView::for_stage(ModelVisible);
        assert!(shown.bars_open && shown.model_visible && shown.marquee_visible);
    }
}

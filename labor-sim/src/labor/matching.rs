use rand::Rng;
use rand::seq::SliceRandom;
use slotmap::SlotMap;

use crate::agents::{Firm, Household};
use crate::types::{FirmId, Hours};

// === MATCH RESULT ===

/// Hiring record for one firm in one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirmHiring {
    pub firm: FirmId,
    pub vacancies: usize,
    pub hired: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// Households placed this tick (sum of `hired_count`).
    pub employed: usize,
    /// Job slots offered across all firms.
    pub vacancies: usize,
    /// In firm order.
    pub hirings: Vec<FirmHiring>,
}

impl MatchOutcome {
    pub fn unfilled(&self) -> usize {
        self.vacancies.saturating_sub(self.employed)
    }
}

// === MATCHING ===

/// Match households to firm vacancies for one tick.
///
/// Every employer link is cleared, then a uniform shuffle of the households
/// sets the order in which they are handed out. Firms are served in arena
/// order from a single cursor into that shuffle, so when slots outnumber
/// households the firms earlier in the arena fill first and the rest go
/// short. Firm demand must already be computed for this tick.
pub fn match_tick<R: Rng>(
    firms: &mut SlotMap<FirmId, Firm>,
    households: &mut [Household],
    legal_workday: Hours,
    rng: &mut R,
) -> MatchOutcome {
    for household in households.iter_mut() {
        household.employer = None;
    }

    let mut queue: Vec<usize> = (0..households.len()).collect();
    queue.shuffle(rng);

    let mut cursor = 0;
    let mut outcome = MatchOutcome {
        hirings: Vec::with_capacity(firms.len()),
        ..Default::default()
    };

    for (firm_id, firm) in firms.iter_mut() {
        let vacancies = firm.vacancies(legal_workday);
        let hired = vacancies.min(queue.len() - cursor);

        for &idx in &queue[cursor..cursor + hired] {
            households[idx].employer = Some(firm_id);
        }
        cursor += hired;

        firm.hired_count = hired;
        outcome.employed += hired;
        // Vacancies saturate at usize::MAX under extreme demand
        outcome.vacancies = outcome.vacancies.saturating_add(vacancies);
        outcome.hirings.push(FirmHiring {
            firm: firm_id,
            vacancies,
            hired,
        });
    }

    outcome
}

use std::sync::Arc;

use crate::{
    config::MatchConfig,
    domain::{
        Seat,
        r#match::{MatchOutcome, decide_forfeit, forfeit_tally},
        rating::MatchScore,
        room::Room,
        seat::SeatService,
    },
    workflow::gameplay::{
        Settlement,
        settle::{SettleMatchError, SettleMatchWorkflow},
    },
};

#[async_trait::async_trait]
pub trait ForfeitMatchWorkflow {
    /// Settles the match in favour of the seat that stays. Must be called
    /// while both members are still seated.
    async fn forfeit(&self, room: &mut Room, leaver: Seat) -> Result<Settlement, SettleMatchError>;
}

pub struct ForfeitMatchWorkflowImpl<S: SeatService, W: SettleMatchWorkflow> {
    seat_service: Arc<S>,
    settle_workflow: Arc<W>,
    draw_threshold: f64,
    set_count: usize,
}

impl<S: SeatService, W: SettleMatchWorkflow> ForfeitMatchWorkflowImpl<S, W> {
    pub fn new(seat_service: Arc<S>, settle_workflow: Arc<W>, config: &MatchConfig) -> Self {
        Self {
            seat_service,
            settle_workflow,
            draw_threshold: config.draw_threshold(),
            set_count: config.set_count,
        }
    }
}

#[async_trait::async_trait]
impl<S: SeatService + Send + Sync + 'static, W: SettleMatchWorkflow + Send + Sync + 'static>
    ForfeitMatchWorkflow for ForfeitMatchWorkflowImpl<S, W>
{
    async fn forfeit(&self, room: &mut Room, leaver: Seat) -> Result<Settlement, SettleMatchError> {
        let remaining = leaver.opponent();
        let remaining_sets_won = match self.seat_service.get_sets_won(room.seat_key(remaining)) {
            Some(sets_won) => sets_won,
            None => {
                log::warn!(
                    "Seat {} of room {} is missing, forfeiting with no sets won",
                    remaining,
                    room.key
                );
                0.0
            }
        };
        let outcome = decide_forfeit(remaining, remaining_sets_won, self.draw_threshold);
        let sets_won = forfeit_tally(outcome, self.set_count);
        let settlement = self
            .settle_workflow
            .settle(room, outcome, sets_won, true)
            .await?;
        if outcome == MatchOutcome::Draw {
            for seat in Seat::ALL {
                self.seat_service
                    .credit_set(room.seat_key(seat), MatchScore::Draw);
            }
        }
        Ok(settlement)
    }
}

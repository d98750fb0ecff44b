//! Leaderboard and per-participant performance views

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::ParticipantId;
use types::participant::{Participant, ParticipantStatus};
use types::portfolio::PortfolioView;

use crate::calc;

/// One leaderboard entry, ranked by equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub rank: u32,
    pub participant_id: ParticipantId,
    pub name: String,
    pub provider: String,
    pub model: String,
    pub status: ParticipantStatus,
    pub equity: Decimal,
    pub return_pct: Decimal,
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
}

/// Rank participants by current equity, highest first. Ties break by
/// name so the ordering is stable across refreshes.
pub fn leaderboard(participants: &[Participant], initial_capital: Decimal) -> Vec<LeaderboardRow> {
    let mut sorted: Vec<&Participant> = participants.iter().collect();
    sorted.sort_by(|a, b| {
        b.current_equity
            .cmp(&a.current_equity)
            .then_with(|| a.name.cmp(&b.name))
    });

    sorted
        .into_iter()
        .enumerate()
        .map(|(idx, p)| LeaderboardRow {
            rank: idx as u32 + 1,
            participant_id: p.id,
            name: p.name.clone(),
            provider: p.provider.clone(),
            model: p.model.clone(),
            status: p.status,
            equity: p.current_equity,
            return_pct: calc::pnl_pct(p.current_equity - initial_capital, initial_capital),
            total_trades: p.total_trades,
            winning_trades: p.winning_trades,
            losing_trades: p.losing_trades,
        })
        .collect()
}

/// Performance summary for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub participant_id: ParticipantId,
    pub status: ParticipantStatus,
    pub equity: Decimal,
    pub peak_equity: Decimal,
    pub return_pct: Decimal,
    /// Drop from peak equity, in percent of the peak
    pub max_drawdown_pct: Decimal,
    /// Winning closes over all closes, in percent
    pub win_rate_pct: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
}

pub fn performance(
    participant: &Participant,
    view: &PortfolioView,
    initial_capital: Decimal,
) -> PerformanceReport {
    let closes = participant.winning_trades + participant.losing_trades;
    PerformanceReport {
        participant_id: participant.id,
        status: participant.status,
        equity: participant.current_equity,
        peak_equity: participant.peak_equity,
        return_pct: calc::pnl_pct(
            participant.current_equity - initial_capital,
            initial_capital,
        ),
        max_drawdown_pct: calc::pnl_pct(
            participant.peak_equity - participant.current_equity,
            participant.peak_equity,
        ),
        win_rate_pct: calc::pnl_pct(
            Decimal::from(participant.winning_trades),
            Decimal::from(closes),
        ),
        realized_pnl: view.realized_pnl,
        unrealized_pnl: view.unrealized_pnl,
        total_trades: participant.total_trades,
        winning_trades: participant.winning_trades,
        losing_trades: participant.losing_trades,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::ids::CompetitionId;
    use types::participant::ParticipantParams;
    use types::portfolio::Portfolio;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn make_participant(name: &str, equity: &str) -> Participant {
        let mut p = Participant::new(
            CompetitionId::new(),
            ParticipantParams {
                name: name.into(),
                provider: "anthropic".into(),
                model: "m".into(),
                model_config: serde_json::Value::Null,
                invocation_timeout_secs: 60,
            },
            dec("10000"),
            Utc::now(),
        );
        p.update_equity(dec(equity));
        p
    }

    #[test]
    fn test_leaderboard_ranks_by_equity() {
        let participants = vec![
            make_participant("bravo", "9000"),
            make_participant("alpha", "12000"),
            make_participant("charlie", "10500"),
        ];

        let rows = leaderboard(&participants, dec("10000"));
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "charlie", "bravo"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].return_pct, dec("20"));
        assert_eq!(rows[2].return_pct, dec("-10"));
    }

    #[test]
    fn test_leaderboard_tie_breaks_by_name() {
        let participants = vec![
            make_participant("zeta", "10000"),
            make_participant("alpha", "10000"),
        ];
        let rows = leaderboard(&participants, dec("10000"));
        assert_eq!(rows[0].name, "alpha");
        assert_eq!(rows[1].name, "zeta");
    }

    #[test]
    fn test_performance_report() {
        let mut p = make_participant("agent", "12000");
        p.update_equity(dec("9000"));
        p.record_trade(None);
        p.record_trade(Some(dec("100")));
        p.record_trade(Some(dec("-50")));

        let portfolio = Portfolio::new(p.id, dec("9000"), Utc::now());
        let view = crate::portfolio::view(&portfolio, &[]);
        let report = performance(&p, &view, dec("10000"));

        assert_eq!(report.return_pct, dec("-10"));
        // Peak 12 000 → current 9 000 is a 25% drawdown
        assert_eq!(report.max_drawdown_pct, dec("25"));
        // 1 win of 2 closes
        assert_eq!(report.win_rate_pct, dec("50"));
        assert_eq!(report.total_trades, 3);
    }
}

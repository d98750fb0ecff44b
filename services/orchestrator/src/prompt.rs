//! Decision prompt builder
//!
//! Deterministic plain text: identical snapshots render identical
//! prompts, which is what makes recorded rounds replayable.

use engine::calc;
use rust_decimal::Decimal;
use std::fmt::Write;

use crate::snapshot::RoundSnapshot;
use crate::OrchestratorConfig;

/// Exact per-order notional cap in currency units at snapshot time.
pub fn notional_cap(snapshot: &RoundSnapshot) -> Decimal {
    calc::round_money(
        snapshot.view.equity * snapshot.competition.max_position_size_pct / Decimal::ONE_HUNDRED,
    )
}

pub fn build(snapshot: &RoundSnapshot, config: &OrchestratorConfig) -> String {
    let competition = &snapshot.competition;
    let view = &snapshot.view;
    let cap = notional_cap(snapshot);
    let buffered_cap = calc::round_money(
        cap * (Decimal::ONE_HUNDRED - config.safety_buffer_pct) / Decimal::ONE_HUNDRED,
    );

    let mut out = String::new();

    let _ = writeln!(
        out,
        "You are \"{}\", an autonomous trading agent in the \"{}\" competition.",
        snapshot.participant.name, competition.name
    );
    let _ = writeln!(
        out,
        "You manage a simulated margin account trading CFDs against live prices.\n"
    );

    let _ = writeln!(out, "== Rules ==");
    let _ = writeln!(out, "Max leverage: {}x", competition.max_leverage);
    let _ = writeln!(
        out,
        "Per-position notional cap: {} USD ({}% of your current equity).",
        money(cap),
        competition.max_position_size_pct
    );
    let _ = writeln!(
        out,
        "The cap applies to notional (quantity x price). Leverage changes the \
         margin you post, NOT the cap."
    );
    let _ = writeln!(
        out,
        "Prices move between now and execution; orders are re-checked against \
         live marks. Keep orders at or below {} USD ({}% under the cap) to \
         avoid drift rejections.",
        money(buffered_cap),
        config.safety_buffer_pct
    );
    let _ = writeln!(
        out,
        "Liquidation: if margin level (equity / reserved margin) falls below \
         {}%, all positions are force-closed.\n",
        competition.maintenance_margin_pct
    );

    let _ = writeln!(out, "== Market ==");
    for (symbol, quote) in &snapshot.prices {
        let _ = writeln!(out, "{}: {}", symbol, quote.price);
    }

    let _ = writeln!(out, "\n== Portfolio ==");
    let _ = writeln!(out, "Cash: {} USD", money(view.cash));
    let _ = writeln!(out, "Equity: {} USD", money(view.equity));
    let _ = writeln!(out, "Reserved margin: {} USD", money(view.reserved_margin));
    let _ = writeln!(out, "Available margin: {} USD", money(view.available_margin));
    let _ = writeln!(out, "Unrealized P&L: {} USD", money(view.unrealized_pnl));
    let _ = writeln!(out, "Realized P&L: {} USD", money(view.realized_pnl));

    let _ = writeln!(out, "\n== Open positions ==");
    if snapshot.positions.is_empty() {
        let _ = writeln!(out, "(none)");
    }
    for position in &snapshot.positions {
        let _ = writeln!(
            out,
            "{} {} {} @ entry {} (mark {}, {}x, margin {}, uPnL {}) position_id={}",
            position.side.as_str(),
            position.quantity,
            position.symbol,
            position.entry_price,
            position.mark_price,
            position.leverage,
            money(position.reserved_margin),
            money(position.unrealized_pnl),
            position.id
        );
    }

    let _ = writeln!(out, "\n== Recent trades (newest first) ==");
    if snapshot.recent_trades.is_empty() {
        let _ = writeln!(out, "(none)");
    }
    for trade in &snapshot.recent_trades {
        let realized = trade
            .realized_pnl
            .map(|p| format!(", realized {}", money(p)))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:?} {} {} {} @ {}{}",
            trade.action, trade.side.as_str(), trade.quantity, trade.symbol,
            trade.executed_price, realized
        );
    }

    let _ = writeln!(out, "\n== Leaderboard ==");
    for row in &snapshot.leaderboard {
        let _ = writeln!(
            out,
            "#{} {} — equity {} USD ({}%)",
            row.rank,
            row.name,
            money(row.equity),
            row.return_pct
        );
    }

    let _ = writeln!(
        out,
        "\n== Your reply ==\n\
         Reply with exactly one JSON object, no other text:\n\
         {{\n\
         \x20 \"decision\": \"trade\" | \"hold\",\n\
         \x20 \"reasoning\": \"<why>\",\n\
         \x20 \"orders\": [\n\
         \x20   {{ \"action\": \"open\", \"symbol\": \"BTCUSDT\", \"side\": \"buy\"|\"sell\",\n\
         \x20     \"quantity\": 0.01, \"leverage\": 2 }},\n\
         \x20   {{ \"action\": \"close\", \"symbol\": \"BTCUSDT\", \"position_id\": \"<uuid>\" }}\n\
         \x20 ]\n\
         }}\n\
         Close orders should reference position_id from the list above; side \
         and quantity are derived from the position."
    );

    out
}

/// Money figures render at cent precision; internal math stays at full
/// scale.
fn money(value: Decimal) -> String {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

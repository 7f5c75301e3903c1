//! Script-body renderers, one per catalog entry. Each returns the condition
//! block ending in a `trigger = <condition>` binding; the shared header,
//! marker shape and alert registration are appended by `generate`.

use super::ResolvedParams;

pub(super) fn breakout(params: &ResolvedParams) -> String {
    let lookback = params.int("lookback");
    let (source, tag) = match params.text("basis") {
        "Close" => ("close", "C"),
        _ => ("high", "H"),
    };
    format!(
        r#"priorHigh = ta.highest({source}[1], {lookback})
trigger   = ta.crossover(close, priorHigh)
plot(priorHigh, "Prior {lookback}{tag}", color=color.red)"#
    )
}

pub(super) fn breakdown(params: &ResolvedParams) -> String {
    let lookback = params.int("lookback");
    let (source, tag) = match params.text("basis") {
        "Close" => ("close", "C"),
        _ => ("low", "L"),
    };
    format!(
        r#"priorLow = ta.lowest({source}[1], {lookback})
trigger  = ta.crossunder(close, priorLow)
plot(priorLow, "Prior {lookback}{tag}", color=color.red)"#
    )
}

pub(super) fn ma10_breakdown(_: &ResolvedParams) -> String {
    sma_breakdown(10, "color.blue")
}

pub(super) fn ma50_breakdown(_: &ResolvedParams) -> String {
    sma_breakdown(50, "color.purple")
}

fn sma_breakdown(window: u32, color: &str) -> String {
    format!(
        r#"ma = ta.sma(close, {window})
trigger = ta.crossunder(close, ma)
plot(ma, "SMA{window}", color={color})"#
    )
}

pub(super) fn bullish_reversal(_: &ResolvedParams) -> String {
    r#"three_red_then_green = close[4] < open[4] and close[3] < open[3] and close[2] < open[2] and close[1] > open[1]
setup_high = high[1]
setup_low  = math.min(low[4], math.min(low[3], low[2]))

var float range_high = na
var float range_low  = na
var bool  armed      = false

if three_red_then_green
    range_high := setup_high
    range_low  := setup_low
    armed      := true

range_established   = armed and not na(range_high) and not na(range_low)
breakout_condition  = range_established and high > range_high + syminfo.mintick
invalidated         = range_established and low < range_low

if breakout_condition or invalidated
    armed      := false
    range_high := na
    range_low  := na

plot(range_established ? range_high : na, "Range High", color=color.new(color.blue, 0))
plot(range_established ? range_low  : na, "Range Low",  color=color.new(color.red, 0))
trigger = breakout_condition"#
        .to_string()
}

pub(super) fn bearish_reversal(_: &ResolvedParams) -> String {
    r#"three_green_then_red = close[4] > open[4] and close[3] > open[3] and close[2] > open[2] and close[1] < open[1]
setup_low  = low[1]
setup_high = math.max(high[4], math.max(high[3], high[2]))

var float range_high = na
var float range_low  = na
var bool  armed      = false

if three_green_then_red
    range_high := setup_high
    range_low  := setup_low
    armed      := true

range_established    = armed and not na(range_high) and not na(range_low)
breakdown_condition  = range_established and low < range_low - syminfo.mintick
invalidated          = range_established and high > range_high

if breakdown_condition or invalidated
    armed      := false
    range_high := na
    range_low  := na

plot(range_established ? range_high : na, "Range High", color=color.new(color.blue, 0))
plot(range_established ? range_low  : na, "Range Low",  color=color.new(color.red, 0))
trigger = breakdown_condition"#
        .to_string()
}

pub(super) fn opening_range_high(params: &ResolvedParams) -> String {
    opening_range(
        params.text("session"),
        "breakout_condition = armed and high > or_high + syminfo.mintick",
    )
}

pub(super) fn opening_range_low(params: &ResolvedParams) -> String {
    opening_range(
        params.text("session"),
        "breakout_condition = armed and low < or_low - syminfo.mintick",
    )
}

fn opening_range(session: &str, condition: &str) -> String {
    format!(
        r#"in_window   = not na(time(timeframe.period, "{session}"))
new_session = ta.change(time("D")) != 0

var float or_high = na
var float or_low  = na
var bool  armed   = false
var bool  fired   = false

if new_session
    or_high := na
    or_low  := na
    armed   := false
    fired   := false

if in_window
    or_high := na(or_high) ? high : math.max(or_high, high)
    or_low  := na(or_low)  ? low  : math.min(or_low,  low)

if not in_window and not na(or_high) and not fired
    armed := true

{condition}

if breakout_condition
    armed := false
    fired := true

plot(or_high, "OR High", color=color.new(color.blue, 0))
plot(or_low,  "OR Low",  color=color.new(color.red, 0))
trigger = breakout_condition"#
    )
}

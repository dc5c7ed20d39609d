// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators feeding the
// prediction engine.  Every function is total over its inputs: short series
// degrade to documented fallback values instead of erroring, so callers can
// run the full indicator suite over whatever history they managed to fetch.

pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod volume;

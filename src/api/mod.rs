// =============================================================================
// API Module
// =============================================================================
//
// HTTP surface of the engine. Everything lives under `/api/v1/` and speaks
// JSON; see `rest` for the router and handlers.

pub mod rest;

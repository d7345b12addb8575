/// UI layer: sidebar controls and the chart rendering sink.
///
/// Everything here consumes the aggregates from [`crate::data::stats`];
/// no statistics are computed in this module.
pub mod charts;
pub mod panels;

//! Aggregation module - concurrent fan-out to marketplace clients, result
//! bucketing and price normalization.

mod aggregation_model;
mod price_comparison_service;

pub use aggregation_model::{
    AggregatedResult, ComparedListing, NormalizedPrice, PriceAnalysis, SearchRequest, SourceReport,
};
pub use price_comparison_service::PriceComparisonService;

pub mod chat_domain_service;
pub mod thread_enrichment;

pub use chat_domain_service::ChatDomainService;
pub use thread_enrichment::{EnrichedGroups, ThreadEnrichmentService};

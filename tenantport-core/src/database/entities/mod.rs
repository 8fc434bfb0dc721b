// Tenant bookkeeping
pub mod accounts;
pub mod account_exports;
pub mod account_imports;
pub mod account_join_codes;
pub mod identities;

// Migrating entities
pub mod accesses;
pub mod assignments;
pub mod attachments;
pub mod blobs;
pub mod board_publications;
pub mod boards;
pub mod card_activity_spikes;
pub mod card_goldnesses;
pub mod card_not_nows;
pub mod cards;
pub mod closures;
pub mod columns;
pub mod comments;
pub mod entropies;
pub mod events;
pub mod filters;
pub mod mentions;
pub mod notification_bundles;
pub mod notifications;
pub mod pins;
pub mod reactions;
pub mod rich_texts;
pub mod steps;
pub mod taggings;
pub mod tags;
pub mod users;
pub mod watches;
pub mod webhook_deliveries;
pub mod webhook_delinquency_trackers;
pub mod webhooks;

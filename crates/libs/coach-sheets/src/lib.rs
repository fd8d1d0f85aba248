//! Spreadsheet-backed evidence marking.
//!
//! The grading workflow keeps its records in an external spreadsheet. This crate
//! finds a student across the spreadsheet's tabs, resolves the tab holding their
//! components, and brokers marking requests: a request row is appended to the
//! group's processing tab and the group's output tab is polled until a result
//! row with the same evidence id shows up.
//!
//! The spreadsheet is reached only through the [`gateway::SheetGateway`] trait.
//! [`google::GoogleSheetsGateway`] talks to the Sheets v4 API and
//! [`memory::MemoryGateway`] keeps everything in process for tests.
//!
//! ```rust
//! use std::sync::Arc;
//! use coach_sheets::{desk::EvidenceDesk, group::GroupMapping, memory::MemoryGateway, locator::StudentQuery};
//!
//! # async fn example() -> coach_sheets::prelude::Result<()> {
//! let gateway = MemoryGateway::new()
//!     .with_tab("Students", vec![
//!         vec!["ID".into(), "Email".into(), "Name".into(), "Coach".into(), "Group".into()],
//!         vec!["1001".into(), "jane@x.com".into(), "Jane".into(), "Omar".into(), "PCP".into()],
//!     ])
//!     .with_tab("PCP", vec![
//!         vec!["ID".into(), "Email".into(), "Name".into(), "Components".into(), "Evidence".into()],
//!         vec!["1001".into(), "jane@x.com".into(), "Jane".into(), "Portfolio".into(), "".into()],
//!     ]);
//! let desk = EvidenceDesk::new(Arc::new(gateway), GroupMapping::default());
//! let found = desk.student_components(&StudentQuery::by_email("jane@x.com")).await?;
//! assert_eq!(found.target_sheet, "PCP");
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod cell;
pub mod desk;
pub mod error;
pub mod extractor;
pub mod gateway;
pub mod google;
pub mod group;
pub mod locator;
pub mod memory;
pub mod prelude;

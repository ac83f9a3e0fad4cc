/*!
# Applicant Management System

A small web application for recording, searching and reporting on job
applicants, built in Rust.

## Overview

Clerks log in, key in each applicant from the intake form and later look
applicants up by name, date, desired position or year. Every applicant is one
row of a worksheet; the worksheet is the system of record and is re-read on
every page view. A gated editor rewrites the worksheet wholesale, and a
feedback form lets clerks report problems to the maintainer by mail.

## Architecture

### Frontend Layer
- **Technologies**: HTML, CSS, server-rendered Handlebars templates
- **Pages**:
  - Login page
  - New applicant entry form
  - Search, history and analytics views
  - Feedback form and the maintainer's feedback list
  - Gated editor with CSV/XLSX downloads

### Backend Layer
- **Technologies**: Rust, axum, tokio
- **Core Components**:
  - Record model - Form normalization, age derivation, online marker
  - Search engine - Filters, daily report shaping, history
  - Session store - Cookie sessions and the editor unlock code
  - Chart renderer - Applicants per day as an SVG line chart
  - Notifier - SMTP mail to the maintainer

### Data Persistence Layer
- `SheetStore` trait: read a worksheet by columns, overwrite it wholesale
- File storage with Gzip compression and bincode serialization
- In-memory storage for tests and demos
- CSV and XLSX export

## Modules

- **record**: Applicant and feedback rows, form normalization
- **search**: Search, history and report shaping
- **store**: Worksheet storage backends
- **login**: Authentication and session management
- **mailer**: Feedback notification email
- **downloader**: Export functionality (CSV, XLSX)
- **graph**: Applicants-per-day series and chart rendering
- **config**: TOML configuration with environment overrides
- **error**: Error types shared across modules
- **app**: Routing, pages and middleware

## Routes

- `/` - Login page, or the entry form once logged in
- `/login`, `/logout` - Session transitions
- `/applicants` - Submit a new applicant
- `/search`, `/search/download` - Search views and their CSV
- `/history` - Last ten entries
- `/analytics`, `/analytics/chart.svg` - Chart page and image
- `/feedback`, `/feedback/all` - Feedback form and list
- `/edit/...` - Gated editor and full-table exports
*/

pub mod config;
pub mod downloader;
pub mod error;
pub mod graph;
pub mod login;
pub mod record;
pub mod search;
pub mod store;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod mailer;

pub use config::AppConfig;
pub use error::{ConfigError, StoreError, ValidationError};
pub use record::{ApplicantRecord, FeedbackRecord};
pub use store::{FileStore, MemoryStore, SheetStore, Table};

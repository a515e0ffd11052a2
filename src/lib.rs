/*! # `birdlens`

The library behind BirdLens, a web gallery for uploading, tagging, and
searching bird photos.

## Purpose

This crate holds the tag taxonomy, the search form logic, and the REST backend
the gallery's front end talks to.

Tags can depend on each other. A `location` value like "Forest" can belong to
the `continent` value "Asia", so picking a continent narrows down the
locations you're offered. The crate keeps those dependencies acyclic, filters
values by whatever parents are picked, and clears stale picks when a parent
changes.

## Layout

- [`tags`]: key naming, the dependency graph, and dependent-value filtering.
- [`search`]: building search criteria (and their "active filter" chips), then
  turning them into SQL.
- [`forms`]: immutable state for the tag and search forms.
- [`database`]: the SQLite-backed tag and photo stores.
- [`media`]: storing uploads and optimizing them for display.
- [`api`]: the `axum` router.

## Running

`cargo run --bin birdlens-server`. See `src/main.rs` for the environment
variables it reads.

## Status

- [x] Tag taxonomy with parent-scoped values
- [x] Search by tag prefix and date range
- [x] Upload, edit, delete, and stats
- [x] On-demand resizing
- [ ] Authentication
    - Handled outside this crate for now.
*/

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod forms;
pub mod media;
pub mod models;
pub mod search;
pub mod tags;

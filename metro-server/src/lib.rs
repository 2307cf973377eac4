//! Metro departures server.
//!
//! Answers "when are the next departures from the station I'm at?":
//! locates the nearest station, works out which timetable is in force
//! (weekday, Saturday or Sunday/holiday; winter or summer) and lists the
//! departures still to come, grouped by direction.

pub mod config;
pub mod domain;
pub mod geo;
pub mod reference;
pub mod repository;
pub mod schedule;
pub mod service;
pub mod store;
pub mod web;

/// Unit-level tests run through the public API
mod basic_tests;
mod streak_scenarios;

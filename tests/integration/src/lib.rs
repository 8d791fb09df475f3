//! End-to-end tests for the voting engine: a real store task, an
//! in-memory catalog, and a manually-driven clock.

#[cfg(test)]
mod helpers;

#[cfg(test)]
mod ballots;
#[cfg(test)]
mod refills;
#[cfg(test)]
mod winners;

//! Unit and behavioural tests for the protocol engine.

mod support;

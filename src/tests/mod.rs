//! Scenario tests for the token engine, driven through the scripted
//! collaborators in `test_utils`

mod send_transaction_tests;
mod wallet_gate_tests;

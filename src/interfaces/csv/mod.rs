//! CSV input of flow intents and CSV output of flow outcomes.

pub mod intent_reader;
pub mod outcome_writer;

pub mod position_reader;

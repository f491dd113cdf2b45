pub mod history_file;

// Integration suites for the synonym memory, compiled into one test binary.
mod engine;
mod import_export;
mod persistence;

mod execution;
mod files;
mod settings;

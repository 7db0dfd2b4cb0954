pub mod sdk_files;

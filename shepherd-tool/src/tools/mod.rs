mod calculator;
mod list_dir;
mod read_file;
mod run_cmd;
mod write_file;

pub use calculator::CalculatorTool;
pub use list_dir::ListDirTool;
pub use read_file::ReadFileTool;
pub use run_cmd::RunCmdTool;
pub use write_file::WriteFileTool;

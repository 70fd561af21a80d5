use anyhow::Result;
use clap::Parser;
use taskboard::cli::{Cli, Command};
use taskboard::commands;

fn main() -> Result<()> {
    let args = Cli::parse();
    let command = args.command.unwrap_or(Command::Tui);
    let ctx = match command {
        Command::Init => commands::Context::init(args.board_dir.as_deref())?,
        _ => commands::Context::locate(args.board_dir.as_deref())?,
    };
    ctx.start_logging(&args.log_level);
    match command {
        Command::Init => commands::init(&ctx),
        Command::Show { list } => commands::show(&ctx, list),
        Command::AddList { name } => commands::add_list(&ctx, name),
        Command::RenameList { list_id, name } => commands::rename_list(&ctx, &list_id, &name),
        Command::DeleteList { list_id } => commands::delete_list(&ctx, &list_id),
        Command::Add { list_id, text } => commands::add(&ctx, &list_id, &text),
        Command::Toggle { list_id, task_id } => commands::toggle(&ctx, &list_id, &task_id),
        Command::Edit {
            list_id,
            task_id,
            text,
        } => commands::edit(&ctx, &list_id, &task_id, &text),
        Command::Delete { list_id, task_id } => commands::delete(&ctx, &list_id, &task_id),
        Command::Move {
            task_id,
            list_id,
            position,
        } => commands::move_task(&ctx, &task_id, &list_id, position),
        Command::Tui => commands::tui(&ctx),
    }
}

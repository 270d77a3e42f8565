use serde_json::{Map, Number, Value};

use crate::{
    ledger::{Column, RowIndex, Table},
    query::{self, PredicateSet},
    utils::build_info,
};

use super::{
    output,
    registry::CommandEntry,
    shell_context::{CommandError, CommandResult, ShellContext},
};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("list", "Show every row of the ledger", "list", cmd_list),
        CommandEntry::new(
            "filter",
            "Show rows matching all predicates",
            "filter <key=value>...",
            cmd_filter,
        ),
        CommandEntry::new(
            "sum",
            "Sum an amount column over matching rows",
            "sum <InputValue|OutputValue> [key=value]...",
            cmd_sum,
        ),
        CommandEntry::new("add", "Insert a transaction", "add <column=value>...", cmd_add),
        CommandEntry::new("remove", "Remove rows by index", "remove <index>...", cmd_remove),
        CommandEntry::new("commit", "Back up and save the ledger", "commit", cmd_commit),
        CommandEntry::new("backup", "Snapshot the store file for today", "backup", cmd_backup),
        CommandEntry::new("restore", "Restore the newest snapshot", "restore", cmd_restore),
        CommandEntry::new("snapshots", "List backup snapshots", "snapshots", cmd_snapshots),
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new("help", "Show available commands", "help [command]", cmd_help),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    print_table(context.manager.table()?);
    Ok(())
}

fn cmd_filter(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let predicates = parse_predicates(args)?;
    let result = context.manager.filter(&predicates)?;
    print_table(&result);
    Ok(())
}

fn cmd_sum(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (column, rest) = args
        .split_first()
        .ok_or_else(|| CommandError::InvalidArguments("usage: sum <column> [key=value]...".into()))?;
    let predicates = parse_predicates(rest)?;
    let matched = context.manager.filter(&predicates)?;
    let total = query::sum_by_name(&matched, column)?;
    output::info(format!("Sum of {}: {:.2}", column, total));
    Ok(())
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let mut columns = Map::new();
    for (key, value) in parse_assignments(args)? {
        let parsed = match Column::from_name(&key).and_then(|column| column.amount()) {
            Some(_) => {
                let number = value
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .ok_or_else(|| {
                        CommandError::InvalidArguments(format!("`{}` is not a number", value))
                    })?;
                Value::Number(number)
            }
            None => Value::String(value),
        };
        columns.insert(key, parsed);
    }
    let index = context.manager.insert_columns(&columns)?;
    output::success(format!("Added row {}.", index));
    Ok(())
}

fn cmd_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(CommandError::InvalidArguments(
            "usage: remove <index>...".into(),
        ));
    }
    let indices = args
        .iter()
        .map(|raw| {
            raw.parse::<RowIndex>().map_err(|_| {
                CommandError::InvalidArguments(format!("`{}` is not a row index", raw))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let removed = context.manager.remove(&indices)?;
    output::success(format!("Removed {} row(s).", removed));
    Ok(())
}

fn cmd_commit(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if let Some(snapshot) = context.manager.commit()? {
        output::info(format!("Previous store backed up to {}.", snapshot.display()));
    }
    let rows = context.manager.table()?.len();
    output::success(format!("Saved {} row(s).", rows));
    Ok(())
}

fn cmd_backup(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.manager.backup()? {
        Some(path) => output::success(format!("Backup written to {}.", path.display())),
        None => output::info("Nothing to back up yet."),
    }
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let snapshot = context.manager.restore()?;
    output::success(format!("Restored backup from {}.", snapshot.date));
    Ok(())
}

fn cmd_snapshots(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let snapshots = context.manager.backups().list_snapshots()?;
    if snapshots.is_empty() {
        output::info("No backups found.");
        return Ok(());
    }
    output::section("Backups");
    for snapshot in snapshots {
        output::info(format!("{}  {}", snapshot.date, snapshot.path.display()));
    }
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("IFO Ledger {}", meta.version));
    output::two_column(&meta.rows());
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.registry.get(&name.to_lowercase()) {
            Some(entry) => output::info(format!("{}\n  usage: {}", entry.description, entry.usage)),
            None => output::warning(format!("No help for `{}`.", name)),
        }
        return Ok(());
    }
    output::section("Commands");
    let rows: Vec<(&str, String)> = context
        .registry
        .list()
        .into_iter()
        .map(|entry| (entry.usage, entry.description.to_string()))
        .collect();
    output::two_column(&rows);
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

fn parse_assignments(args: &[&str]) -> Result<Vec<(String, String)>, CommandError> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.to_string()))
                .ok_or_else(|| {
                    CommandError::InvalidArguments(format!("expected key=value, got `{}`", arg))
                })
        })
        .collect()
}

fn parse_predicates(args: &[&str]) -> Result<PredicateSet, CommandError> {
    Ok(parse_assignments(args)?.into_iter().collect())
}

fn print_table(table: &Table) {
    if table.is_empty() {
        output::info("No transactions.");
        return;
    }
    for row in table {
        let record = &row.record;
        output::info(format!(
            "{:>5}  {}  {:<10}  {:<12}  {:<4}  {:>10.2} -> {:<14}  {:>10.2} <- {:<14}  {}",
            row.index,
            record.date.format("%Y-%m-%d"),
            record.kind.as_str(),
            record.category,
            record.currency,
            record.input_value,
            record.input_account,
            record.output_value,
            record.output_account,
            record.description
        ));
    }
    output::info(format!("{} row(s).", table.len()));
}

use std::fs::File;

use anyhow::{Error, Result};
use itertools::Itertools;
use rustyline::error::ReadlineError;
use rustyline::Editor;

use crate::main_entry::{QueryResult, Session};
use crate::util::pretty_batches;

pub fn interactive(mut session: Session) -> Result<()> {
    let mut rl = Editor::<()>::new()?;
    load_history(&mut rl);

    loop {
        let read_sql = read_sql(&mut rl);
        match read_sql {
            Ok(sql) => {
                if !sql.trim().is_empty() {
                    rl.add_history_entry(sql.as_str());
                    run_sql(&mut session, sql)?;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
            }
            Err(ReadlineError::Eof) => {
                println!("Exited");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    save_history(&mut rl);
    Ok(())
}

fn load_history(rl: &mut Editor<()>) {
    let path = dirs::cache_dir().map(|p| {
        let cache_dir = p.join("plparam");
        std::fs::create_dir_all(cache_dir.as_path()).ok();
        let history_path = cache_dir.join("history.txt");
        if !history_path.as_path().exists() {
            File::create(history_path.as_path()).ok();
        }
        history_path.into_boxed_path()
    });

    if let Some(ref path) = path {
        if rl.load_history(path).is_err() {
            println!("No previous history.");
        }
    }
}

fn save_history(rl: &mut Editor<()>) {
    let path = dirs::cache_dir().map(|p| {
        let cache_dir = p.join("plparam");
        let history_path = cache_dir.join("history.txt");
        history_path.into_boxed_path()
    });

    if let Some(ref path) = path {
        if let Err(err) = rl.save_history(path) {
            println!("Save history failed {}.", err);
        }
    }
}

fn read_sql(rl: &mut Editor<()>) -> Result<String, ReadlineError> {
    let mut sql = String::new();
    loop {
        let prompt = if sql.is_empty() { "> " } else { "? " };
        let line = rl.readline(prompt)?;
        if line.is_empty() {
            continue;
        }

        // internal commands starts with "\"
        if line.starts_with('\\') && sql.is_empty() {
            return Ok(line);
        }

        sql.push_str(line.as_str());
        if line.ends_with(';') {
            return Ok(sql);
        } else {
            sql.push('\n');
        }
    }
}

fn run_sql(session: &mut Session, sql: String) -> Result<()> {
    if let Some(cmds) = sql.trim().strip_prefix('\\') {
        if let Err(err) = run_internal(session, cmds.trim()) {
            println!("Run Internal {} Err: {}", cmds, err);
        }
        return Ok(());
    }

    match session.run(sql.as_str()) {
        Ok(results) => {
            for result in results.iter() {
                print_result(result)?;
            }
        }
        Err(err) => println!("Run Error: {}", err),
    }
    Ok(())
}

fn print_result(result: &QueryResult) -> Result<()> {
    match result {
        QueryResult::Command(tag) => println!("{}", tag),
        QueryResult::Executed(executed) => {
            println!("{}", executed.sql());
            pretty_batches(&[executed.params().clone()]);
        }
        other => {
            if let Some(batch) = other.to_record_batch()? {
                pretty_batches(&[batch]);
            }
        }
    }
    Ok(())
}

fn run_internal(session: &Session, cmds: &str) -> Result<()> {
    match cmds {
        "d" => {
            for table in session.catalog().tables() {
                let columns = table
                    .columns()
                    .iter()
                    .map(|col| format!("{} {}", col.name, col.ty))
                    .join(", ");
                println!("{} ({})", table.name(), columns);
            }
            Ok(())
        }
        "p" => {
            for prepared in session.prepared_statements() {
                println!(
                    "{}({}): {}",
                    prepared.name(),
                    prepared.param_types().iter().join(", "),
                    prepared.statement()
                );
            }
            Ok(())
        }
        _ => Err(Error::msg("Unknown internal command")),
    }
}

use std::collections::{BTreeMap, HashMap};

use stagehand::{Error, Result};

pub type CmdResult<T> = Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod backup;
pub mod create;
pub mod names;
pub mod rename;
pub mod swap;
pub mod title;

/// Parse `OLD=NEW` pairs into a rename table. `OLD=` maps to the empty
/// (disable) sentinel.
pub(crate) fn parse_rename_pairs(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut table = HashMap::new();
    for pair in pairs {
        let (old, new) = pair.split_once('=').ok_or_else(|| {
            Error::Format(format!("'{pair}' is not an OLD=NEW pair"))
        })?;
        if old.is_empty() {
            return Err(Error::Format(format!("'{pair}' has an empty old name")));
        }
        table.insert(old.to_string(), new.to_string());
    }
    Ok(table)
}

/// Parse `A:B` channel pairs into a permutation mapping each member of a
/// pair to the other. A channel may appear in at most one pair.
pub(crate) fn parse_swap_pairs(pairs: &[String]) -> Result<BTreeMap<u8, u8>> {
    let mut permutation = BTreeMap::new();
    for pair in pairs {
        let (a, b) = pair
            .split_once(':')
            .ok_or_else(|| Error::Format(format!("'{pair}' is not an A:B channel pair")))?;
        let a = parse_channel(a)?;
        let b = parse_channel(b)?;
        if permutation.contains_key(&a) || permutation.contains_key(&b) {
            return Err(Error::Format(format!(
                "channel in pair '{pair}' is swapped more than once"
            )));
        }
        permutation.insert(a, b);
        permutation.insert(b, a);
    }
    Ok(permutation)
}

/// Permutation that moves one channel to a new position, shifting every
/// channel in between by one.
pub(crate) fn chain_permutation(from: u8, to: u8) -> Result<BTreeMap<u8, u8>> {
    if !(1..=32).contains(&from) || !(1..=32).contains(&to) {
        return Err(Error::Format("channel numbers go from 1 to 32".into()));
    }
    if from == to {
        return Err(Error::Format("channel is already at that position".into()));
    }
    let mut permutation = BTreeMap::new();
    if from < to {
        for k in from + 1..=to {
            permutation.insert(k, k - 1);
        }
    } else {
        for k in to..from {
            permutation.insert(k, k + 1);
        }
    }
    permutation.insert(from, to);
    Ok(permutation)
}

fn parse_channel(s: &str) -> Result<u8> {
    let n: u8 = s
        .parse()
        .map_err(|_| Error::Format(format!("'{s}' is not a channel number")))?;
    if !(1..=32).contains(&n) {
        return Err(Error::Format("channel numbers go from 1 to 32".into()));
    }
    Ok(n)
}

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
    ($args:expr, $global:expr, $module:ident, $handler:ident) => {
        crate::output::map_cmd_result_to_json($module::$handler($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Create(args) => dispatch!(args, global, create),
        crate::Commands::Rename(args) => dispatch!(args, global, rename),
        crate::Commands::Swap(args) => dispatch!(args, global, swap),
        crate::Commands::Names(args) => dispatch!(args, global, names),
        crate::Commands::Title(args) => dispatch!(args, global, title),
        crate::Commands::Backup(args) => dispatch!(args, global, backup, run_backup),
        crate::Commands::Revert(args) => dispatch!(args, global, backup, run_revert),
        crate::Commands::Export(args) => dispatch!(args, global, backup, run_export),
    }
}

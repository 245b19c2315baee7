//! Available commands and autocomplete logic

use crate::elder::Resource;

/// What running a command does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTarget {
  /// Replace the root page with a resource listing
  Page(Resource),
  Logs,
  /// Drop every cached result and go back to the first page
  Logout,
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  pub target: CommandTarget,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "orgs",
    aliases: &["o", "org", "organizations"],
    description: "Organizations",
    target: CommandTarget::Page(Resource::Organizations),
  },
  Command {
    name: "entities",
    aliases: &["e", "entity"],
    description: "Tracked entities",
    target: CommandTarget::Page(Resource::Entities),
  },
  Command {
    name: "deps",
    aliases: &["d", "dependencies", "dependency"],
    description: "Entity dependencies",
    target: CommandTarget::Page(Resource::Dependencies),
  },
  Command {
    name: "labels",
    aliases: &["l", "label"],
    description: "Labels",
    target: CommandTarget::Page(Resource::Labels),
  },
  Command {
    name: "oncall",
    aliases: &["rotations", "rotation"],
    description: "On-call rotations",
    target: CommandTarget::Page(Resource::Rotations),
  },
  Command {
    name: "audit",
    aliases: &["a", "auditlogs"],
    description: "Audit log",
    target: CommandTarget::Page(Resource::AuditLogs),
  },
  Command {
    name: "jobs",
    aliases: &["j", "backupjobs"],
    description: "Backup jobs",
    target: CommandTarget::Page(Resource::BackupJobs),
  },
  Command {
    name: "backups",
    aliases: &["b", "backup", "restore"],
    description: "Completed backups",
    target: CommandTarget::Page(Resource::Backups),
  },
  Command {
    name: "sbom",
    aliases: &["s", "components"],
    description: "SBOM components",
    target: CommandTarget::Page(Resource::SbomComponents),
  },
  Command {
    name: "tenants",
    aliases: &["t", "tenant"],
    description: "Tenants (admin)",
    target: CommandTarget::Page(Resource::Tenants),
  },
  Command {
    name: "users",
    aliases: &["u", "user"],
    description: "Users (admin)",
    target: CommandTarget::Page(Resource::Users),
  },
  Command {
    name: "logs",
    aliases: &["log"],
    description: "Server log tail and search",
    target: CommandTarget::Logs,
  },
  Command {
    name: "logout",
    aliases: &["signout"],
    description: "Clear cached data",
    target: CommandTarget::Logout,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit elder-console",
    target: CommandTarget::Quit,
  },
];

/// Resolve a submitted command name or alias.
pub fn find(input: &str) -> Option<&'static Command> {
  let input = input.trim().to_lowercase();
  COMMANDS
    .iter()
    .find(|c| c.name == input || c.aliases.contains(&input.as_str()))
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Stable sort keeps table order within a priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

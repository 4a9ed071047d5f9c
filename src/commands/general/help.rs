use poise::Command;
use crate::{HoradricContext, Error};

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Display the list of commands available, as well as their descriptions.")
)]
pub async fn help(
    ctx: HoradricContext<'_>,
    #[description = "The command requested for help"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    #[rest] command: Option<String>
) -> Result<(), Error> {
    match command {
        Some(command) => help_single_command(ctx, &command).await,
        None => help_all_commands(ctx).await
    }
}

/// Walks "autovoice lock" down through subcommands.
pub(crate) fn find_command<'a>(commands: &'a [Command<(), Error>], path: &str) -> Option<&'a Command<(), Error>> {
    let mut words = path.split_whitespace();
    let first = words.next()?;

    let mut current = commands.iter().find(|command| command.name.eq_ignore_ascii_case(first))?;

    for word in words {
        current = current.subcommands.iter().find(|command| command.name.eq_ignore_ascii_case(word))?;
    }

    Some(current)
}

/// Commands here are described through `description_localized`, so fall back to en-US.
fn description_of(command: &Command<(), Error>) -> Option<String> {
    command.description.clone()
        .or_else(|| command.description_localizations.get("en-US").cloned())
}

fn describe(command: &Command<(), Error>) -> String {
    let mut text = match command.help_text {
        Some(f) => f(),
        None => description_of(command).unwrap_or_else(|| "No help available".to_string())
    };

    let subcommands = command.subcommands.iter()
        .filter(|sub| !sub.hide_in_help)
        .map(|sub| format!("`{}` - {}", sub.name, description_of(sub).unwrap_or_else(|| "No help available".to_string())))
        .collect::<Vec<_>>();

    if !subcommands.is_empty() {
        text.push_str("\n\n");
        text.push_str(&subcommands.join("\n"));
    }

    text
}

pub(crate) async fn help_single_command(ctx: HoradricContext<'_>, command_name: &str) -> Result<(), Error> {
    let reply = match find_command(&ctx.framework().options().commands, command_name) {
        Some(command) => describe(command),
        None => format!("No such command `{command_name}`")
    };

    ctx.send(|b| b.content(reply)).await?;
    Ok(())
}

/// Code for printing an overview of all commands (e.g. `~help`)
async fn help_all_commands(ctx: HoradricContext<'_>) -> Result<(), Error> {
    let mut general = Vec::new();
    let mut groups = Vec::new();

    for cmd in &ctx.framework().options().commands {
        if cmd.hide_in_help {
            continue;
        }

        if cmd.subcommands.is_empty() {
            general.push(format!("`{}`", cmd.name));
        } else {
            let list = cmd.subcommands.iter()
                .filter(|sub| !sub.hide_in_help)
                .map(|sub| format!("`{}`", sub.name))
                .collect::<Vec<_>>()
                .join("\n");

            groups.push((cmd.identifying_name.clone(), description_of(cmd).unwrap_or_default(), list));
        }
    }

    ctx.send(|b| b.embed(|e| {
        e
            .title("Horadric Command Help")
            .description("You can fetch help for a specific command by passing the full command as a parameter.")
            .field("General", general.join(" "), false);

        for (name, description, list) in groups {
            e.field(name, format!("_{description}_\n\n{list}"), true);
        }

        e
    })).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_commands() {
        let commands = vec![crate::commands::autovoice::autovoice(), help()];

        assert_eq!(find_command(&commands, "autovoice lock").map(|c| c.name.as_str()), Some("lock"));
        assert_eq!(find_command(&commands, "HELP").map(|c| c.name.as_str()), Some("help"));
        assert!(find_command(&commands, "autovoice nothing").is_none());
        assert!(find_command(&commands, "").is_none());
    }

    #[test]
    fn groups_list_their_subcommands() {
        let text = describe(&crate::commands::autovoice::autovoice());
        assert!(text.contains("`lock`"));
        assert!(text.contains("`limit`"));
    }
}

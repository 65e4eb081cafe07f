//! Scenario command handlers.

use tabled::Tabled;

use etidomo_core::{Manager, ScenarioRecord, ScenarioStatus};

use crate::cli::{GlobalOpts, ScenariosArgs, ScenariosCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ScenarioRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "User")]
    user_defined: String,
}

fn status_label(status: ScenarioStatus) -> String {
    match status {
        ScenarioStatus::Off => "off".into(),
        ScenarioStatus::Transitioning => "transitioning".into(),
        ScenarioStatus::On => "on".into(),
        ScenarioStatus::Unknown(code) => format!("unknown ({code})"),
    }
}

impl From<&ScenarioRecord> for ScenarioRow {
    fn from(s: &ScenarioRecord) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            status: status_label(s.status()),
            user_defined: if s.user_defined { "yes" } else { "no" }.into(),
        }
    }
}

pub async fn handle(
    manager: &mut Manager,
    args: ScenariosArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    manager.login().await?;
    let scenarios = manager.scenarios();

    match args.command {
        ScenariosCommand::List => {
            let list = scenarios.list().await?;
            let out = output::render_list(
                &global.output,
                &list,
                |s| ScenarioRow::from(s),
                |s| s.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
        }
        ScenariosCommand::Activate { id } => {
            scenarios.activate(id).await?;
            if !global.quiet {
                eprintln!("Scenario {id} activated");
            }
        }
        ScenariosCommand::Create { name } => {
            scenarios.create(&name).await?;
            if !global.quiet {
                eprintln!("Recording scenario '{name}'");
            }
        }
        ScenariosCommand::Delete { id } => {
            scenarios.delete(id).await?;
            if !global.quiet {
                eprintln!("Scenario {id} deleted");
            }
        }
    }
    Ok(())
}

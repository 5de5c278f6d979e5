use clap::Parser;
use school_dashboard::api::api_model::ListQuery;
use school_dashboard::api::client::HttpApi;
use school_dashboard::cli::commands::{
    SubmitArgs, cmd_delete, cmd_describe, cmd_forms, cmd_list, cmd_session_clear, cmd_session_set,
    cmd_session_show, cmd_submit, cmd_validate,
};
use school_dashboard::cli::config::{Cli, Commands, SessionCommand, load_config, resolve_settings};
use school_dashboard::cli::logging::init_tracing;
use school_dashboard::session::store::SessionStore;
use school_dashboard::trace::logger::TraceLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref());

    // CLI flag / env var > config file > defaults
    let settings = resolve_settings(&cli, &config);
    let store = SessionStore::new(&settings.session_path);

    match cli.command {
        Commands::Forms => cmd_forms(),
        Commands::Describe { form, set } => cmd_describe(form, &set)?,
        Commands::Validate { form, input, set } => {
            let valid = cmd_validate(form, input.as_deref(), &set)?;
            if !valid {
                std::process::exit(1);
            }
        }
        Commands::Submit {
            form,
            input,
            id,
            set,
            file,
        } => {
            let api = HttpApi::new(&settings.api_url, settings.timeout)?;
            let session = store.load()?;
            let tracer = match &settings.trace_path {
                Some(path) => TraceLogger::new(path),
                None => TraceLogger::disabled(),
            };
            let args = SubmitArgs {
                input,
                id,
                set,
                files: file,
            };
            let saved = cmd_submit(form, &args, &api, &session, &tracer, cli.verbose)?;
            if !saved {
                std::process::exit(1);
            }
        }
        Commands::List {
            resource,
            page,
            page_size,
            search,
            filter,
        } => {
            let api = HttpApi::new(&settings.api_url, settings.timeout)?;
            let session = store.load()?;
            let query = ListQuery {
                page,
                page_size,
                search,
                filters: filter.into_iter().collect(),
            };
            cmd_list(&api, &session, resource, &query)?;
        }
        Commands::Delete { resource, id } => {
            let api = HttpApi::new(&settings.api_url, settings.timeout)?;
            let session = store.load()?;
            cmd_delete(&api, &session, resource, &id)?;
        }
        Commands::Session { action } => match action {
            SessionCommand::Set {
                tenant,
                token,
                roles,
                school,
            } => cmd_session_set(&store, &tenant, &token, &roles, school.as_deref())?,
            SessionCommand::Show => cmd_session_show(&store)?,
            SessionCommand::Clear => cmd_session_clear(&store)?,
        },
    }

    Ok(())
}

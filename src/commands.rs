//! Command handlers. Each one loads the sheet, runs it through the session
//! pipeline and renders the result; none of them hold state between calls.

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    cli::{FilterArgs, InputArgs, OptionsArgs, SearchArgs, SearchField, SelectionArgs, SummaryArgs},
    config::{FuzzySettings, InsightConfig},
    dataset::Dataset,
    filter::{self, FilterSpec},
    fuzzy, io_utils,
    metrics::{CategoryShare, MetricsResult, round_one_decimal},
    pipeline::{self, DashboardView, Session},
    table::{self, Align},
};

pub fn summary(args: &SummaryArgs) -> Result<()> {
    let (mut session, spec) = open_with_selection(&args.input, &args.selection)?;
    let view = session.update(spec)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view.metrics)?);
    } else {
        print!("{}", render_summary(&view.metrics, session.config()));
    }
    info!(
        "Summarized {} of {} ticket(s)",
        view.metrics.total,
        session.dataset().len()
    );
    Ok(())
}

pub fn filter(args: &FilterArgs) -> Result<()> {
    let (mut session, spec) = open_with_selection(&args.input, &args.selection)?;
    let DashboardView { filtered, .. } = session.update(spec)?;
    if args.table {
        let (headers, rows) = filtered.to_table();
        table::print_table(&headers, &rows);
    } else {
        let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
        let delimiter = args.output_delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
        io_utils::write_dataset(&filtered, args.output.as_deref(), delimiter, encoding)
            .context("Writing filtered tickets")?;
    }
    info!(
        "Kept {} of {} ticket(s)",
        filtered.len(),
        session.dataset().len()
    );
    Ok(())
}

pub fn search(args: &SearchArgs) -> Result<()> {
    let session = open_session(&args.input)?;
    let columns = &session.config().columns;
    let candidates = match args.field {
        SearchField::Type => filter::type_options_for(session.dataset(), columns, None)?,
        SearchField::Analysis => filter::analysis_options(session.dataset(), columns)?,
    };
    let settings = FuzzySettings {
        limit: args.limit.unwrap_or(session.config().fuzzy.limit),
        ..session.config().fuzzy.clone()
    };
    let matches = fuzzy::search_with(&args.query, &candidates, &settings)
        .with_context(|| format!("Searching {} candidate(s)", candidates.len()))?;

    let headers = vec!["#".to_string(), "value".to_string(), "score".to_string()];
    let rows = matches
        .iter()
        .enumerate()
        .map(|(idx, m)| {
            vec![
                (idx + 1).to_string(),
                m.label.clone(),
                format!("{:.1}", round_one_decimal(m.score)),
            ]
        })
        .collect::<Vec<_>>();
    print!(
        "{}",
        table::render_aligned(&headers, &rows, &[Align::Right, Align::Left, Align::Right])
    );
    Ok(())
}

pub fn options(args: &OptionsArgs) -> Result<()> {
    let session = open_session(&args.input)?;
    let config = session.config();
    let mut spec = FilterSpec::new();
    if !args.analyses.is_empty() {
        spec = spec.with_analyses(pipeline::normalize_selection(
            &args.analyses,
            &config.columns.analysis,
            config,
        ));
    }
    let options = filter::FilterOptions::derive(session.dataset(), &spec, &config.columns)?;
    println!("{}: {}", config.columns.analysis, options.analyses.join(", "));
    println!("{}: {}", config.columns.kind, options.types.join(", "));
    Ok(())
}

fn open_session(input: &InputArgs) -> Result<Session> {
    let config = InsightConfig::load_or_default(input.config.as_deref())?;
    let raw = load_input(input)?;
    Session::open(raw, config).with_context(|| format!("Preparing {:?}", input.input))
}

fn load_input(input: &InputArgs) -> Result<Dataset> {
    let delimiter = io_utils::resolve_input_delimiter(&input.input, input.delimiter);
    let encoding = io_utils::resolve_encoding(input.input_encoding.as_deref())?;
    debug!(
        "Loading '{}' with delimiter '{}'",
        input.input.display(),
        io_utils::printable_delimiter(delimiter)
    );
    io_utils::load_dataset(&input.input, delimiter, encoding, input.sheet.as_deref())
}

fn open_with_selection(input: &InputArgs, selection: &SelectionArgs) -> Result<(Session, FilterSpec)> {
    let session = open_session(input)?;
    let spec = build_spec(&session, selection)?;
    Ok((session, spec))
}

/// Translates the CLI flags into a [`FilterSpec`], normalizing the selected
/// values the same way the prepared columns were normalized. A `--type-search`
/// narrows the type options offered for the chosen analyses and selects the
/// survivors (intersected with `--type` when both are given).
pub fn build_spec(session: &Session, selection: &SelectionArgs) -> Result<FilterSpec> {
    let config = session.config();
    let columns = &config.columns;
    let mut spec = FilterSpec::new();
    if let Some(ticket) = &selection.ticket {
        spec = spec.with_ticket_query(ticket.as_str());
    }
    if let Some(analyses) = &selection.analyses {
        spec = spec.with_analyses(pipeline::normalize_selection(
            &clean(analyses),
            &columns.analysis,
            config,
        ));
    }

    let mut types = selection
        .types
        .as_ref()
        .map(|types| pipeline::normalize_selection(&clean(types), &columns.kind, config));
    if let Some(query) = selection.type_search.as_deref() {
        let offered = filter::type_options_for(session.dataset(), columns, spec.analyses())?;
        let narrowed = filter::narrow_categories(&offered, query, &config.fuzzy)?;
        debug!("Type search '{query}' kept {} option(s)", narrowed.len());
        types = Some(match types {
            Some(chosen) => narrowed.into_iter().filter(|t| chosen.contains(t)).collect(),
            None => narrowed,
        });
    }
    if let Some(types) = types {
        spec = spec.with_types(types);
    }

    if let Some(expression) = &selection.column_equals {
        let equals = filter::parse_column_equals(expression)?;
        let value = pipeline::normalize_selection(&[equals.value], &equals.column, config);
        spec = spec.with_column_equals(equals.column, value.into_iter().next().unwrap_or_default());
    }
    if selection.from.is_some() || selection.to.is_some() {
        spec = spec.with_date_range(selection.from, selection.to);
    }
    Ok(spec)
}

fn clean(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn render_summary(metrics: &MetricsResult, config: &InsightConfig) -> String {
    let labels = &config.labels;
    let mut output = String::new();

    let tiles = vec![
        vec!["Total de Tickets".to_string(), metrics.total.to_string(), String::new()],
        tile(&labels.ideal, metrics),
        tile(&labels.not_ideal, metrics),
    ];
    output.push_str(&table::render_aligned(
        &["métrica".to_string(), "tickets".to_string(), "%".to_string()],
        &tiles,
        &[Align::Left, Align::Right, Align::Right],
    ));

    for (title, shares) in [
        (config.columns.analysis.as_str(), &metrics.analysis),
        (config.columns.kind.as_str(), &metrics.types),
    ] {
        if shares.is_empty() {
            continue;
        }
        output.push('\n');
        output.push_str(&table::render_aligned(
            &[title.to_string(), "tickets".to_string(), "%".to_string()],
            &share_rows(shares),
            &[Align::Left, Align::Right, Align::Right],
        ));
    }

    output.push('\n');
    output.push_str(&metrics.insight.to_string());
    output.push('\n');
    output
}

fn tile(label: &str, metrics: &MetricsResult) -> Vec<String> {
    vec![
        label.to_string(),
        metrics.label_count(label).to_string(),
        format!("{:.1}", round_one_decimal(metrics.label_percent(label))),
    ]
}

fn share_rows(shares: &[CategoryShare]) -> Vec<Vec<String>> {
    shares
        .iter()
        .map(|share| {
            let label = if share.label.is_empty() {
                "(vazio)".to_string()
            } else {
                share.label.clone()
            };
            vec![
                label,
                share.count.to_string(),
                format!("{:.1}", share.rounded_percent()),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let raw = Dataset::from_records(
            &["Ticket", "Tipo", "Análise", "Canal"],
            vec![
                vec!["T1", "Liveness", "ideal", "app"],
                vec!["T2", "Liveness", " NÃO IDEAL ", "web"],
                vec!["T3", "Outros", "IDEAL", "app"],
                vec!["T4", "Selfie", "Não ideal", "app"],
            ],
        )
        .unwrap();
        Session::open(raw, InsightConfig::default()).unwrap()
    }

    #[test]
    fn build_spec_normalizes_analysis_selection() {
        let session = session();
        let selection = SelectionArgs {
            analyses: Some(vec![" não ideal".to_string()]),
            ..SelectionArgs::default()
        };
        let spec = build_spec(&session, &selection).unwrap();
        let filtered = filter::apply(session.dataset(), &spec, &session.config().columns).unwrap();
        assert_eq!(filtered.row_ids(), vec![1, 3]);
    }

    #[test]
    fn type_search_selects_matching_options_within_analysis() {
        let session = session();
        let selection = SelectionArgs {
            analyses: Some(vec!["NÃO IDEAL".to_string()]),
            type_search: Some("SELFIE".to_string()),
            ..SelectionArgs::default()
        };
        let spec = build_spec(&session, &selection).unwrap();
        assert_eq!(
            spec.types().map(|t| t.iter().cloned().collect::<Vec<_>>()),
            Some(vec!["Selfie".to_string()])
        );
    }

    #[test]
    fn where_clause_and_empty_type_flag() {
        let session = session();
        let selection = SelectionArgs {
            column_equals: Some("Canal=app".to_string()),
            ..SelectionArgs::default()
        };
        let spec = build_spec(&session, &selection).unwrap();
        let filtered = filter::apply(session.dataset(), &spec, &session.config().columns).unwrap();
        assert_eq!(filtered.row_ids(), vec![0, 2, 3]);

        let selection = SelectionArgs {
            types: Some(Vec::new()),
            ..SelectionArgs::default()
        };
        let spec = build_spec(&session, &selection).unwrap();
        assert!(spec.types().is_some_and(|t| t.is_empty()));
    }

    #[test]
    fn summary_always_shows_both_verdict_tiles() {
        let mut session = session();
        let view = session
            .update(FilterSpec::new().with_analyses(["IDEAL"]))
            .unwrap();
        let rendered = render_summary(&view.metrics, session.config());
        assert!(rendered.contains("NÃO IDEAL"));
        assert!(rendered.contains("Liveness concentra 50.0% dos tickets filtrados (1 de 2)."));
    }
}

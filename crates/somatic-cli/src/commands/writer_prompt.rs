use crate::support::load_config_or_exit;
use somatic_repair::templates::DEFAULT_UNLOCK_RULE;
use somatic_repair::{WriterBrief, writer_prompt};

pub struct Args {
    pub title: String,
    pub card_id: String,
    pub pass_condition: String,
    pub locked: bool,
    pub unlock_rule: Option<String>,
    pub notes: Option<String>,
    pub date: Option<String>,
    pub config: Option<String>,
}

pub fn run(args: Args) {
    let config = load_config_or_exit(args.config.as_deref(), None);
    let brief = WriterBrief {
        title: args.title,
        card_id: args.card_id,
        locked: args.locked,
        pass_condition: args.pass_condition,
        unlock_rule: args
            .unlock_rule
            .unwrap_or_else(|| DEFAULT_UNLOCK_RULE.to_string()),
        notes: args.notes.unwrap_or_default(),
        date: args
            .date
            .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string()),
    };
    print!("{}", writer_prompt(&brief, &config.rules));
}

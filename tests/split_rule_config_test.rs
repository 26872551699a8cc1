// ==========================================
// 批量规则配置 集成测试
// ==========================================
// 测试目标: config_kv 规则 / CSV 导入 对拆分行为的影响
// ==========================================

mod test_helpers;

use mrp_batch_split::config::{config_keys, rule_import, ConfigError};
use mrp_batch_split::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use mrp_batch_split::{ActionDescriptor, ApiError, SplitRule, SplitRuleReader, SplitRuleTable};
use std::io::Write;
use tempfile::NamedTempFile;
use test_helpers::{create_test_db, TestEnv};

#[test]
fn test_schema_is_idempotent() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_sqlite_connection(&db_path).unwrap();
    init_schema(&conn).unwrap();
    init_schema(&conn).unwrap();
    assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
}

#[test]
fn test_builtin_rules_apply_without_configuration() {
    let env = TestEnv::new().unwrap();
    let table = env.config.load_rule_table().unwrap();
    assert_eq!(table, SplitRuleTable::builtin());
    for tmpl in [4247, 4248, 4263, 4264, 4265, 4268, 123, 119] {
        assert!(table.is_special_product(tmpl));
        assert_eq!(table.fixed_qty_per_batch(tmpl), 41.0);
    }
}

#[test]
fn test_configured_rules_replace_builtin_table() {
    let env = TestEnv::new().unwrap();
    env.config
        .save_split_rules(&[SplitRule::new(777, 25.0, Some("Custom"))])
        .unwrap();

    let custom = env.seed_order("MO-777", 777, 50.0, &[(1, 10.0)]).unwrap();
    let action = env.api.action_auto_split_fixed_batches(&[custom]).unwrap();
    let orders = env.api.list_productions(action.domain_ids()).unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.product_qty == 25.0));
    assert!(orders.iter().all(|o| o.move_raw_ids[0].product_uom_qty == 5.0));

    // 内置产品不再在允许列表中
    let builtin = env.seed_order("MO-4247", 4247, 82.0, &[]).unwrap();
    assert!(matches!(
        env.api.action_auto_split_fixed_batches(&[builtin]),
        Err(ApiError::NotSpecialProduct { .. })
    ));
}

#[test]
fn test_invalid_rules_are_not_saved() {
    let env = TestEnv::new().unwrap();

    let result = env
        .config
        .save_split_rules(&[SplitRule::new(1, 0.0, None)]);
    assert!(matches!(result, Err(ConfigError::InvalidRule { .. })));

    let result = env
        .config
        .save_split_rules(&[SplitRule::new(1, 10.0, None), SplitRule::new(1, 12.0, None)]);
    assert!(matches!(result, Err(ConfigError::DuplicateRule(1))));

    assert!(env.config.get_split_rules().unwrap().is_none());
}

#[test]
fn test_malformed_rule_json_is_reported() {
    let env = TestEnv::new().unwrap();
    env.config
        .set_global_config_value(config_keys::SPLIT_RULES, "not json")
        .unwrap();

    assert!(matches!(
        env.config.load_rule_table(),
        Err(ConfigError::Malformed { .. })
    ));

    let id = env.seed_order("MO-1", 4247, 82.0, &[]).unwrap();
    assert!(matches!(
        env.api.action_auto_split_fixed_batches(&[id]),
        Err(ApiError::Config(_))
    ));
    assert_eq!(env.production_repo.count().unwrap(), 1);
}

#[test]
fn test_csv_import_drives_split() {
    let env = TestEnv::new().unwrap();

    let mut csv_file = NamedTempFile::new().unwrap();
    writeln!(csv_file, "product_tmpl_id,fixed_qty_per_batch,min_batches,label").unwrap();
    writeln!(csv_file, "500, 10, 2, Widget").unwrap();
    writeln!(csv_file, "501,12.5,,").unwrap();
    csv_file.flush().unwrap();

    let rules = rule_import::read_rules_from_path(csv_file.path()).unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].min_batches, 2);
    assert_eq!(rules[0].label.as_deref(), Some("Widget"));
    assert_eq!(rules[1].min_batches, 1);
    assert_eq!(env.config.save_split_rules(&rules).unwrap(), 2);

    let id = env.seed_order("MO-500", 500, 25.0, &[]).unwrap();
    let action = env.api.action_auto_split_fixed_batches(&[id]).unwrap();
    match action {
        ActionDescriptor::Dialog { context, .. } => {
            assert_eq!(context["default_future_qty"], 30.0);
        }
        other => panic!("Expected Dialog, got {:?}", other),
    }
}

#[test]
fn test_csv_import_missing_file() {
    let result = rule_import::read_rules_from_path(std::path::Path::new("/no/such/rules.csv"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_default_fixed_qty_override() {
    let env = TestEnv::new().unwrap();
    env.config.set_default_fixed_qty(50.0).unwrap();
    assert_eq!(env.config.get_default_fixed_qty().unwrap(), 50.0);

    let table = env.config.load_rule_table().unwrap();
    assert_eq!(table.default_fixed_qty(), 50.0);
    assert_eq!(table.fixed_qty_per_batch(4247), 41.0);
    assert_eq!(table.fixed_qty_per_batch(1), 50.0);

    assert!(env.config.set_default_fixed_qty(-1.0).is_err());
}

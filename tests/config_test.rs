// ==========================================
// 配置管理器集成测试
// ==========================================
// 测试目标: 默认值、学位作用域覆盖、快照恢复、应用到结构计划
// ==========================================


use curricular_engine::config::{
    apply_enrolment_model, apply_locale, config_keys, ConfigError, ConfigManager, ConfigScope,
    EngineConfigReader,
};
use curricular_engine::domain::EnrolmentModelConfigEntry;
use curricular_engine::{CurricularRuleLevel, EnrolmentModel};
use test_helpers::{create_test_db, empty_plan};

fn manager() -> (tempfile::NamedTempFile, ConfigManager) {
    let (temp_file, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();
    (temp_file, manager)
}

#[test]
fn test_defaults_when_unconfigured() {
    let (_temp, manager) = manager();

    assert_eq!(manager.get_enrolment_model("LMAT").unwrap(), EnrolmentModel::Year);
    assert!(manager.get_enrolment_model_config("LMAT").unwrap().is_none());
    assert_eq!(
        manager.get_default_rule_level().unwrap(),
        CurricularRuleLevel::EnrolmentWithRules
    );
    assert_eq!(manager.get_locale().unwrap(), "zh-CN");
}

#[test]
fn test_degree_scope_overrides_global() {
    let (_temp, manager) = manager();
    manager
        .set_config_value(&ConfigScope::Global, config_keys::ENROLMENT_MODEL, "SEMESTER")
        .unwrap();
    manager
        .set_config_value(&ConfigScope::degree("LMAT"), config_keys::ENROLMENT_MODEL, "YEAR")
        .unwrap();

    assert_eq!(manager.get_enrolment_model("LMAT").unwrap(), EnrolmentModel::Year);
    assert_eq!(manager.get_enrolment_model("LEIC").unwrap(), EnrolmentModel::Semester);

    // 再次写入覆盖旧值
    manager
        .set_config_value(&ConfigScope::degree("LMAT"), config_keys::ENROLMENT_MODEL, "SEMESTER")
        .unwrap();
    assert_eq!(manager.get_enrolment_model("LMAT").unwrap(), EnrolmentModel::Semester);
}

#[test]
fn test_enrolment_model_config_json() {
    let (_temp, manager) = manager();
    manager
        .set_config_value(
            &ConfigScope::degree("LMAT"),
            config_keys::ENROLMENT_MODEL_CONFIG,
            "[[1],[2]]",
        )
        .unwrap();

    let config = manager.get_enrolment_model_config("LMAT").unwrap().unwrap();
    assert_eq!(
        config.entries,
        vec![
            EnrolmentModelConfigEntry::new([1]),
            EnrolmentModelConfigEntry::new([2]),
        ]
    );

    // 重叠分组无效
    manager
        .set_config_value(
            &ConfigScope::degree("LEIC"),
            config_keys::ENROLMENT_MODEL_CONFIG,
            "[[1,2],[2]]",
        )
        .unwrap();
    assert!(matches!(
        manager.get_enrolment_model_config("LEIC"),
        Err(ConfigError::Domain(_))
    ));
}

#[test]
fn test_invalid_values() {
    let (_temp, manager) = manager();
    manager
        .set_config_value(&ConfigScope::Global, config_keys::ENROLMENT_MODEL, "TRIMESTER")
        .unwrap();
    manager
        .set_config_value(&ConfigScope::Global, config_keys::DEFAULT_RULE_LEVEL, "WHATEVER")
        .unwrap();
    manager
        .set_config_value(&ConfigScope::Global, config_keys::LOCALE, "pt-PT")
        .unwrap();

    assert!(matches!(
        manager.get_enrolment_model("LMAT"),
        Err(ConfigError::InvalidValue { .. })
    ));
    // 规则执行级别无效时回退默认值
    assert_eq!(
        manager.get_default_rule_level().unwrap(),
        CurricularRuleLevel::EnrolmentWithRules
    );
    assert!(matches!(
        manager.get_locale(),
        Err(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn test_snapshot_and_restore() {
    let (_temp, manager) = manager();
    manager
        .set_config_value(
            &ConfigScope::Global,
            config_keys::DEFAULT_RULE_LEVEL,
            "STANDALONE_ENROLMENT",
        )
        .unwrap();
    manager
        .set_config_value(&ConfigScope::Global, config_keys::LOCALE, "en")
        .unwrap();
    let snapshot = manager.get_config_snapshot().unwrap();

    manager
        .set_config_value(&ConfigScope::Global, config_keys::LOCALE, "zh-CN")
        .unwrap();
    assert_eq!(manager.get_locale().unwrap(), "zh-CN");

    let restored = manager.restore_config_from_snapshot(&snapshot).unwrap();
    assert_eq!(restored, 2);
    assert_eq!(manager.get_locale().unwrap(), "en");
    assert_eq!(
        manager.get_default_rule_level().unwrap(),
        CurricularRuleLevel::StandaloneEnrolment
    );
}

#[test]
fn test_apply_enrolment_model_to_plan() {
    let (_temp, manager) = manager();
    let mut plan = empty_plan();
    manager
        .set_config_value(
            &ConfigScope::degree(plan.degree_code()),
            config_keys::ENROLMENT_MODEL,
            "SEMESTER",
        )
        .unwrap();

    apply_enrolment_model(&manager, &mut plan).unwrap();
    assert_eq!(plan.enrolment_model(), EnrolmentModel::Semester);
    assert_eq!(plan.enrolment_model_config().entries.len(), 2);
}

#[test]
fn test_reopen_keeps_values() {
    let (_temp, db_path) = create_test_db().unwrap();
    {
        let manager = ConfigManager::new(&db_path).unwrap();
        manager
            .set_config_value(&ConfigScope::Global, config_keys::LOCALE, "en")
            .unwrap();
    }
    let manager = ConfigManager::new(&db_path).unwrap();
    assert_eq!(manager.get_locale().unwrap(), "en");
}

#[test]
fn test_apply_locale_switches_rendering() {
    let (_temp, manager) = manager();
    manager
        .set_config_value(&ConfigScope::Global, config_keys::LOCALE, "en")
        .unwrap();

    assert_eq!(apply_locale(&manager).unwrap(), "en");
    assert_eq!(curricular_engine::i18n::current_locale(), "en");
    let message = curricular_engine::engine::RuleResultMessage::new(
        "label.enrolment.degreeModule.already.enrolled",
        vec!["Álgebra".to_string()],
    );
    assert!(curricular_engine::i18n::render(&message).contains("Álgebra"));
    curricular_engine::i18n::set_locale("zh-CN");
}

// ==========================================
// 学籍课程规则引擎 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义规则引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use crate::domain::enrolment_model::EnrolmentModelConfig;
use crate::domain::structure::DegreeCurricularPlan;
use crate::domain::types::{CurricularRuleLevel, EnrolmentModel};
use tracing::info;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 用途: 选课流水线与先修学年规则所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取, 学位作用域覆盖全局）
pub trait EngineConfigReader: Send + Sync {
    /// 获取学位的选课校验粒度
    ///
    /// # 默认值
    /// - YEAR
    fn get_enrolment_model(&self, degree_code: &str) -> ConfigResult<EnrolmentModel>;

    /// 获取学位的显式校验分组
    ///
    /// # 返回
    /// - None: 未配置, 使用选课模型默认分组
    ///
    /// # 格式
    /// - JSON 二维数组, 如 [[1],[2]] 表示两个学期独立校验
    fn get_enrolment_model_config(&self, degree_code: &str) -> ConfigResult<Option<EnrolmentModelConfig>>;

    /// 获取默认规则执行级别
    ///
    /// # 默认值
    /// - ENROLMENT_WITH_RULES
    fn get_default_rule_level(&self) -> ConfigResult<CurricularRuleLevel>;

    /// 获取消息语言
    ///
    /// # 默认值
    /// - zh-CN
    fn get_locale(&self) -> ConfigResult<String>;
}

/// 将学位配置应用到结构计划 (选课模型 + 校验分组)
pub fn apply_enrolment_model(
    reader: &dyn EngineConfigReader,
    plan: &mut DegreeCurricularPlan,
) -> ConfigResult<()> {
    let degree_code = plan.degree_code().to_string();
    let model = reader.get_enrolment_model(&degree_code)?;
    let config = reader.get_enrolment_model_config(&degree_code)?;
    plan.set_enrolment_model(model);
    plan.set_enrolment_model_config(config)?;
    info!(degree = %degree_code, %model, "已应用选课校验配置");
    Ok(())
}

/// 将配置的消息语言设为当前语言
pub fn apply_locale(reader: &dyn EngineConfigReader) -> ConfigResult<String> {
    let locale = reader.get_locale()?;
    crate::i18n::set_locale(&locale);
    Ok(locale)
}

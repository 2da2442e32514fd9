// 协调人审批规则: 学生自助选课被拒, 协调人 / 教务代选放行

use super::{EnrolmentScope, PendingEnrolment};
use crate::domain::rule::CurricularRule;
use crate::engine::result::{RuleResult, RuleResultMessage};

pub(super) fn enrolment(
    scope: &EnrolmentScope<'_>,
    rule: &CurricularRule,
    target: &PendingEnrolment,
) -> RuleResult {
    if !scope.requester.is_self_service() {
        return RuleResult::success();
    }
    RuleResult::failure(
        RuleResultMessage::new(
            "label.EnrolmentToBeApprovedByCoordinator.enrolment.requires.coordinator",
            vec![
                scope.structure.module_name(target.module),
                scope.structure.module_name(rule.degree_module_to_apply_rule),
            ],
        )
        .for_module(target.module),
    )
}

//! Per-class authorization.
//!
//! Admins reach every class. Everyone else reaches a class through a roster
//! row linked to their identity provider account.

use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{MemberKind, Membership, Survey, SurveyDetail};

use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Caller's standing in one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassAccess {
    Admin,
    Instructor { member_id: Uuid },
    Student { member_id: Uuid },
}

impl ClassAccess {
    /// Resolve from the caller and their memberships in the class.
    ///
    /// An instructor row wins over a student row in the same class.
    pub fn resolve(user: &CurrentUser, memberships: &[Membership]) -> Option<Self> {
        if user.is_admin() {
            return Some(ClassAccess::Admin);
        }

        let find = |kind| memberships.iter().find(|m| m.kind == kind);
        if let Some(m) = find(MemberKind::Instructor) {
            return Some(ClassAccess::Instructor {
                member_id: m.member_id,
            });
        }
        find(MemberKind::Student).map(|m| ClassAccess::Student {
            member_id: m.member_id,
        })
    }

    pub fn is_staff(&self) -> bool {
        !matches!(self, ClassAccess::Student { .. })
    }

    /// Fail unless the caller administers or instructs the class.
    pub fn require_staff(self) -> AppResult<Self> {
        if self.is_staff() {
            Ok(self)
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Students only see open surveys.
    pub fn sees(&self, survey: &Survey) -> bool {
        self.is_staff() || survey.is_open
    }

    /// Roster id of the calling student.
    pub fn student_id(&self) -> AppResult<Uuid> {
        match self {
            ClassAccess::Student { member_id } => Ok(*member_id),
            _ => Err(AppError::bad_request(
                "Only students of this class can do that",
            )),
        }
    }
}

/// Caller's access to `class_id`, or `Forbidden` when they are not on its roster.
pub async fn class_access(
    state: &AppState,
    user: &CurrentUser,
    class_id: Uuid,
) -> AppResult<ClassAccess> {
    if user.is_admin() {
        return Ok(ClassAccess::Admin);
    }

    let memberships = state
        .cohort_client
        .list_memberships(&user.id, Some(class_id))
        .await?;

    ClassAccess::resolve(user, &memberships).ok_or(AppError::Forbidden)
}

/// Admin or instructor of `class_id`.
pub async fn staff_access(
    state: &AppState,
    user: &CurrentUser,
    class_id: Uuid,
) -> AppResult<ClassAccess> {
    class_access(state, user, class_id).await?.require_staff()
}

/// Roster id of the caller as a student of `class_id`.
pub async fn student_access(state: &AppState, user: &CurrentUser, class_id: Uuid) -> AppResult<Uuid> {
    class_access(state, user, class_id).await?.student_id()
}

/// Survey plus the caller's access to its class.
pub async fn survey_access(
    state: &AppState,
    user: &CurrentUser,
    survey_id: Uuid,
) -> AppResult<(SurveyDetail, ClassAccess)> {
    let detail = state.cohort_client.get_survey(survey_id).await?;
    let access = class_access(state, user, detail.survey.class_id).await?;
    Ok((detail, access))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{Role, SurveyKind};

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: "user_2abc".to_string(),
            email: "ada@example.com".to_string(),
            role,
        }
    }

    fn membership(class_id: Uuid, kind: MemberKind) -> Membership {
        Membership {
            class_id,
            member_id: Uuid::new_v4(),
            kind,
        }
    }

    #[test]
    fn test_admin_needs_no_membership() {
        assert_eq!(
            ClassAccess::resolve(&user(Role::Admin), &[]),
            Some(ClassAccess::Admin)
        );
    }

    #[test]
    fn test_non_member_has_no_access() {
        assert_eq!(ClassAccess::resolve(&user(Role::Instructor), &[]), None);
        assert_eq!(ClassAccess::resolve(&user(Role::Student), &[]), None);
    }

    #[test]
    fn test_instructor_row_wins() {
        let class_id = Uuid::new_v4();
        let student = membership(class_id, MemberKind::Student);
        let instructor = membership(class_id, MemberKind::Instructor);

        let access =
            ClassAccess::resolve(&user(Role::Instructor), &[student, instructor.clone()]).unwrap();
        assert_eq!(
            access,
            ClassAccess::Instructor {
                member_id: instructor.member_id
            }
        );
        assert!(access.is_staff());
        assert!(access.student_id().is_err());
    }

    #[test]
    fn test_membership_decides_over_global_role() {
        let class_id = Uuid::new_v4();
        let student = membership(class_id, MemberKind::Student);

        // An instructor enrolled as a student elsewhere is a student there
        let access = ClassAccess::resolve(&user(Role::Instructor), &[student.clone()]).unwrap();
        assert_eq!(access.student_id().unwrap(), student.member_id);
        assert!(matches!(access.require_staff(), Err(AppError::Forbidden)));
    }

    #[test]
    fn test_students_only_see_open_surveys() {
        let mut survey = Survey {
            id: Uuid::new_v4(),
            class_id: Uuid::new_v4(),
            title: "Week 1 check-in".to_string(),
            kind: SurveyKind::CourseFeedback,
            week: Some(1),
            is_open: true,
            due_at: None,
            created_at: Utc::now(),
        };
        let student = ClassAccess::Student {
            member_id: Uuid::new_v4(),
        };
        assert!(student.sees(&survey));

        survey.is_open = false;
        assert!(!student.sees(&survey));
        assert!(ClassAccess::Admin.sees(&survey));
    }
}

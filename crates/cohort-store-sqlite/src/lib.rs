use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use cohort_storage::{
    assemble_group, assemble_group_set, AppliedChanges, ClassroomId, CreateGroupSetParams,
    CreateGroupsParams, EnrollStudentParams, Enrollment, EnrollmentRemoval, EnrollmentUpdate, Group,
    GroupChanges, GroupDetail, GroupId, GroupSet, GroupSetChanges, GroupSetDetail, GroupSetId,
    Membership, MembershipChange, MembershipStatus, Store, StoreError, StudentId,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    /// Open (or create, with `?mode=rwc`) the database at `url` and run migrations.
    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(backend)?
            .foreign_keys(true);

        // A single connection serializes writers and keeps `:memory:` databases alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(backend)?;

        MIGRATOR.run(&pool).await.map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }
}

// ─────────────────────────────── Row mapping ───────────────────────────────

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn write_err(e: sqlx::Error) -> StoreError {
    let s = e.to_string();
    if s.contains("UNIQUE") {
        StoreError::AlreadyExists
    } else {
        StoreError::Backend(s)
    }
}

fn parse_id(s: &str) -> Result<Uuid, StoreError> {
    Uuid::try_parse(s).map_err(|e| StoreError::Backend(e.to_string()))
}

fn capacity_from_db(v: Option<i64>) -> Result<Option<u32>, StoreError> {
    v.map(u32::try_from)
        .transpose()
        .map_err(|e| StoreError::Backend(format!("invalid max_members: {e}")))
}

#[derive(sqlx::FromRow)]
struct EnrollmentRow {
    classroom_id: String,
    student_id: String,
    email: String,
    name: Option<String>,
    enrolled_at: DateTime<Utc>,
}

impl TryFrom<EnrollmentRow> for Enrollment {
    type Error = StoreError;

    fn try_from(r: EnrollmentRow) -> Result<Self, Self::Error> {
        Ok(Enrollment {
            classroom_id: ClassroomId(parse_id(&r.classroom_id)?),
            student_id: StudentId(parse_id(&r.student_id)?),
            email: r.email,
            name: r.name,
            enrolled_at: r.enrolled_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GroupSetRow {
    id: String,
    classroom_id: String,
    name: String,
    self_signup: bool,
    join_approval: bool,
    max_members: Option<i64>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GroupSetRow> for GroupSet {
    type Error = StoreError;

    fn try_from(r: GroupSetRow) -> Result<Self, Self::Error> {
        Ok(GroupSet {
            id: GroupSetId(parse_id(&r.id)?),
            classroom_id: ClassroomId(parse_id(&r.classroom_id)?),
            name: r.name,
            self_signup: r.self_signup,
            join_approval: r.join_approval,
            max_members: capacity_from_db(r.max_members)?,
            image: r.image,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: String,
    group_set_id: String,
    name: String,
    max_members: Option<i64>,
    image: Option<String>,
    position: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GroupRow> for Group {
    type Error = StoreError;

    fn try_from(r: GroupRow) -> Result<Self, Self::Error> {
        Ok(Group {
            id: GroupId(parse_id(&r.id)?),
            group_set_id: GroupSetId(parse_id(&r.group_set_id)?),
            name: r.name,
            max_members: capacity_from_db(r.max_members)?,
            image: r.image,
            position: u32::try_from(r.position)
                .map_err(|e| StoreError::Backend(format!("invalid position: {e}")))?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    group_id: String,
    student_id: String,
    status: String,
    join_date: Option<DateTime<Utc>>,
    requested_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = StoreError;

    fn try_from(r: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Membership {
            group_id: GroupId(parse_id(&r.group_id)?),
            student_id: StudentId(parse_id(&r.student_id)?),
            status: MembershipStatus::from_str(&r.status)
                .map_err(|e| StoreError::Backend(e.to_string()))?,
            join_date: r.join_date,
            requested_at: r.requested_at,
        })
    }
}

fn convert<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// ─────────────────────────────── Queries shared by reads and writes ───────────────────────────────

const GROUP_SET_COLUMNS: &str =
    "id, classroom_id, name, self_signup, join_approval, max_members, image, created_at, updated_at";
const GROUP_COLUMNS: &str =
    "id, group_set_id, name, max_members, image, position, created_at, updated_at";

async fn fetch_group_set(
    conn: &mut SqliteConnection,
    id: &GroupSetId,
) -> Result<GroupSet, StoreError> {
    let row = sqlx::query_as::<_, GroupSetRow>(&format!(
        "SELECT {GROUP_SET_COLUMNS} FROM group_sets WHERE id = ?"
    ))
    .bind(id.0.to_string())
    .fetch_optional(&mut *conn)
    .await
    .map_err(backend)?
    .ok_or(StoreError::NotFound)?;
    row.try_into()
}

async fn fetch_group(conn: &mut SqliteConnection, id: &GroupId) -> Result<Group, StoreError> {
    let row = sqlx::query_as::<_, GroupRow>(&format!(
        "SELECT {GROUP_COLUMNS} FROM student_groups WHERE id = ?"
    ))
    .bind(id.0.to_string())
    .fetch_optional(&mut *conn)
    .await
    .map_err(backend)?
    .ok_or(StoreError::NotFound)?;
    row.try_into()
}

async fn fetch_groups_of_set(
    conn: &mut SqliteConnection,
    id: &GroupSetId,
) -> Result<Vec<Group>, StoreError> {
    let rows = sqlx::query_as::<_, GroupRow>(&format!(
        "SELECT {GROUP_COLUMNS} FROM student_groups WHERE group_set_id = ? ORDER BY position, name"
    ))
    .bind(id.0.to_string())
    .fetch_all(&mut *conn)
    .await
    .map_err(backend)?;
    convert(rows)
}

async fn fetch_memberships_of_set(
    conn: &mut SqliteConnection,
    id: &GroupSetId,
) -> Result<Vec<Membership>, StoreError> {
    let rows = sqlx::query_as::<_, MembershipRow>(
        "SELECT m.group_id, m.student_id, m.status, m.join_date, m.requested_at
         FROM memberships m
         JOIN student_groups g ON g.id = m.group_id
         WHERE g.group_set_id = ?
         ORDER BY m.requested_at",
    )
    .bind(id.0.to_string())
    .fetch_all(&mut *conn)
    .await
    .map_err(backend)?;
    convert(rows)
}

async fn fetch_roster(
    conn: &mut SqliteConnection,
    classroom_id: &ClassroomId,
) -> Result<Vec<Enrollment>, StoreError> {
    let rows = sqlx::query_as::<_, EnrollmentRow>(
        "SELECT classroom_id, student_id, email, name, enrolled_at
         FROM enrollments WHERE classroom_id = ? ORDER BY email",
    )
    .bind(classroom_id.0.to_string())
    .fetch_all(&mut *conn)
    .await
    .map_err(backend)?;
    convert(rows)
}

async fn load_group_set_detail(
    conn: &mut SqliteConnection,
    id: &GroupSetId,
) -> Result<GroupSetDetail, StoreError> {
    let set = fetch_group_set(conn, id).await?;
    let groups = fetch_groups_of_set(conn, id).await?;
    let memberships = fetch_memberships_of_set(conn, id).await?;
    let roster = fetch_roster(conn, &set.classroom_id).await?;
    Ok(assemble_group_set(set, groups, &memberships, &roster))
}

async fn load_group_detail(
    conn: &mut SqliteConnection,
    id: &GroupId,
) -> Result<GroupDetail, StoreError> {
    let group = fetch_group(conn, id).await?;
    let set = fetch_group_set(conn, &group.group_set_id).await?;

    let memberships: Vec<Membership> = convert(
        sqlx::query_as::<_, MembershipRow>(
            "SELECT group_id, student_id, status, join_date, requested_at
             FROM memberships WHERE group_id = ? ORDER BY requested_at",
        )
        .bind(id.0.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(backend)?,
    )?;

    // Limit the roster join to students that actually appear in this group.
    let present: HashSet<StudentId> = memberships.iter().map(|m| m.student_id).collect();
    let roster: Vec<Enrollment> = fetch_roster(conn, &set.classroom_id)
        .await?
        .into_iter()
        .filter(|e| present.contains(&e.student_id))
        .collect();

    Ok(assemble_group(group, &memberships, &roster))
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    // ───────────────────────────── Roster ─────────────────────────────

    async fn upsert_enrollment(
        &self,
        p: &EnrollStudentParams,
    ) -> Result<EnrollmentUpdate, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "INSERT INTO enrollments(classroom_id, student_id, email, name, enrolled_at)
             VALUES(?, ?, ?, ?, ?)
             ON CONFLICT(classroom_id, student_id)
             DO UPDATE SET email = excluded.email, name = excluded.name",
        )
        .bind(p.classroom_id.0.to_string())
        .bind(p.student_id.0.to_string())
        .bind(&p.email)
        .bind(&p.name)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        let row = sqlx::query_as::<_, EnrollmentRow>(
            "SELECT classroom_id, student_id, email, name, enrolled_at
             FROM enrollments WHERE classroom_id = ? AND student_id = ?",
        )
        .bind(p.classroom_id.0.to_string())
        .bind(p.student_id.0.to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;
        let roster = fetch_roster(&mut tx, &p.classroom_id).await?;

        tx.commit().await.map_err(backend)?;
        Ok(EnrollmentUpdate {
            enrollment: row.try_into()?,
            roster,
        })
    }

    async fn get_enrollment(
        &self,
        classroom_id: &ClassroomId,
        student_id: &StudentId,
    ) -> Result<Enrollment, StoreError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            "SELECT classroom_id, student_id, email, name, enrolled_at
             FROM enrollments WHERE classroom_id = ? AND student_id = ?",
        )
        .bind(classroom_id.0.to_string())
        .bind(student_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)?;
        row.try_into()
    }

    async fn list_enrollments(
        &self,
        classroom_id: &ClassroomId,
    ) -> Result<Vec<Enrollment>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(backend)?;
        fetch_roster(&mut conn, classroom_id).await
    }

    async fn remove_enrollment(
        &self,
        classroom_id: &ClassroomId,
        student_id: &StudentId,
    ) -> Result<EnrollmentRemoval, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let affected = sqlx::query_as::<_, (String,)>(
            "SELECT DISTINCT g.group_set_id
             FROM memberships m
             JOIN student_groups g ON g.id = m.group_id
             JOIN group_sets s ON s.id = g.group_set_id
             WHERE s.classroom_id = ? AND m.student_id = ?",
        )
        .bind(classroom_id.0.to_string())
        .bind(student_id.0.to_string())
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;

        sqlx::query(
            "DELETE FROM memberships
             WHERE student_id = ?
               AND group_id IN (
                   SELECT g.id FROM student_groups g
                   JOIN group_sets s ON s.id = g.group_set_id
                   WHERE s.classroom_id = ?
               )",
        )
        .bind(student_id.0.to_string())
        .bind(classroom_id.0.to_string())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        let removed = sqlx::query("DELETE FROM enrollments WHERE classroom_id = ? AND student_id = ?")
            .bind(classroom_id.0.to_string())
            .bind(student_id.0.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        if removed.rows_affected() == 0 && affected.is_empty() {
            return Err(StoreError::NotFound);
        }

        let mut group_sets = Vec::with_capacity(affected.len());
        for (id,) in &affected {
            let id = GroupSetId(parse_id(id)?);
            group_sets.push(load_group_set_detail(&mut tx, &id).await?);
        }
        let roster = fetch_roster(&mut tx, classroom_id).await?;

        tx.commit().await.map_err(backend)?;
        Ok(EnrollmentRemoval { roster, group_sets })
    }

    // ───────────────────────────── Group sets ─────────────────────────────

    async fn create_group_set(&self, p: &CreateGroupSetParams) -> Result<GroupSetDetail, StoreError> {
        let id = GroupSetId::new();
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(backend)?;
        sqlx::query(
            "INSERT INTO group_sets(id, classroom_id, name, self_signup, join_approval, max_members, image, created_at, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.0.to_string())
        .bind(p.classroom_id.0.to_string())
        .bind(&p.name)
        .bind(p.self_signup)
        .bind(p.join_approval)
        .bind(p.max_members.map(i64::from))
        .bind(&p.image)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        let detail = load_group_set_detail(&mut tx, &id).await?;
        tx.commit().await.map_err(backend)?;
        Ok(detail)
    }

    async fn get_group_set(&self, group_set_id: &GroupSetId) -> Result<GroupSet, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(backend)?;
        fetch_group_set(&mut conn, group_set_id).await
    }

    async fn list_group_sets(&self, classroom_id: &ClassroomId) -> Result<Vec<GroupSet>, StoreError> {
        let rows = sqlx::query_as::<_, GroupSetRow>(&format!(
            "SELECT {GROUP_SET_COLUMNS} FROM group_sets WHERE classroom_id = ? ORDER BY created_at, name"
        ))
        .bind(classroom_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        convert(rows)
    }

    async fn update_group_set(
        &self,
        group_set_id: &GroupSetId,
        changes: &GroupSetChanges,
    ) -> Result<GroupSetDetail, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let mut current = fetch_group_set(&mut tx, group_set_id).await?;

        if let Some(name) = &changes.name {
            current.name = name.clone();
        }
        if let Some(v) = changes.self_signup {
            current.self_signup = v;
        }
        if let Some(v) = changes.join_approval {
            current.join_approval = v;
        }
        if let Some(v) = changes.max_members {
            current.max_members = v;
        }
        if let Some(v) = &changes.image {
            current.image = v.clone();
        }

        sqlx::query(
            "UPDATE group_sets
             SET name = ?, self_signup = ?, join_approval = ?, max_members = ?, image = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&current.name)
        .bind(current.self_signup)
        .bind(current.join_approval)
        .bind(current.max_members.map(i64::from))
        .bind(&current.image)
        .bind(Utc::now())
        .bind(group_set_id.0.to_string())
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        let detail = load_group_set_detail(&mut tx, group_set_id).await?;
        tx.commit().await.map_err(backend)?;
        Ok(detail)
    }

    async fn delete_group_set(&self, group_set_id: &GroupSetId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM group_sets WHERE id = ?")
            .bind(group_set_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ───────────────────────────── Groups ─────────────────────────────

    async fn create_groups(&self, p: &CreateGroupsParams) -> Result<GroupSetDetail, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Group set must exist; the FK alone would surface as a backend error.
        fetch_group_set(&mut tx, &p.group_set_id).await?;

        let (next_position,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM student_groups WHERE group_set_id = ?",
        )
        .bind(p.group_set_id.0.to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        let now = Utc::now();
        for (offset, name) in p.names.iter().enumerate() {
            let id = GroupId::new();
            sqlx::query(
                "INSERT INTO student_groups(id, group_set_id, name, max_members, image, position, created_at, updated_at)
                 VALUES(?, ?, ?, ?, NULL, ?, ?, ?)",
            )
            .bind(id.0.to_string())
            .bind(p.group_set_id.0.to_string())
            .bind(name)
            .bind(p.max_members.map(i64::from))
            .bind(next_position + offset as i64)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        let detail = load_group_set_detail(&mut tx, &p.group_set_id).await?;
        tx.commit().await.map_err(backend)?;
        Ok(detail)
    }

    async fn get_group(&self, group_id: &GroupId) -> Result<Group, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(backend)?;
        fetch_group(&mut conn, group_id).await
    }

    async fn list_groups(&self, group_set_id: &GroupSetId) -> Result<Vec<Group>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(backend)?;
        fetch_groups_of_set(&mut conn, group_set_id).await
    }

    async fn update_group(
        &self,
        group_id: &GroupId,
        changes: &GroupChanges,
    ) -> Result<GroupDetail, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let mut current = fetch_group(&mut tx, group_id).await?;

        if let Some(name) = &changes.name {
            current.name = name.clone();
        }
        if let Some(v) = changes.max_members {
            current.max_members = v;
        }
        if let Some(v) = &changes.image {
            current.image = v.clone();
        }

        sqlx::query(
            "UPDATE student_groups SET name = ?, max_members = ?, image = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&current.name)
        .bind(current.max_members.map(i64::from))
        .bind(&current.image)
        .bind(Utc::now())
        .bind(group_id.0.to_string())
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        let detail = load_group_detail(&mut tx, group_id).await?;
        tx.commit().await.map_err(backend)?;
        Ok(detail)
    }

    async fn delete_group(&self, group_id: &GroupId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM student_groups WHERE id = ?")
            .bind(group_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ───────────────────────────── Memberships ─────────────────────────────

    async fn list_group_set_memberships(
        &self,
        group_set_id: &GroupSetId,
    ) -> Result<Vec<Membership>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(backend)?;
        fetch_memberships_of_set(&mut conn, group_set_id).await
    }

    async fn add_membership(&self, m: &Membership) -> Result<GroupDetail, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Insert only while the student is on the roster of the group's classroom.
        let inserted = sqlx::query(
            "INSERT INTO memberships(group_id, student_id, status, join_date, requested_at)
             SELECT g.id, ?, ?, ?, ?
             FROM student_groups g
             JOIN group_sets s ON s.id = g.group_set_id
             JOIN enrollments e ON e.classroom_id = s.classroom_id AND e.student_id = ?
             WHERE g.id = ?",
        )
        .bind(m.student_id.0.to_string())
        .bind(m.status.as_str())
        .bind(m.join_date)
        .bind(m.requested_at)
        .bind(m.student_id.0.to_string())
        .bind(m.group_id.0.to_string())
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;
        if inserted.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        let detail = load_group_detail(&mut tx, &m.group_id).await?;
        tx.commit().await.map_err(backend)?;
        Ok(detail)
    }

    async fn apply_membership_changes(
        &self,
        group_id: &GroupId,
        changes: &[MembershipChange],
    ) -> Result<AppliedChanges, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let mut touched = 0;

        for change in changes {
            let result = match change {
                MembershipChange::SetStatus {
                    student_id,
                    status,
                    join_date,
                } => sqlx::query(
                    "UPDATE memberships SET status = ?, join_date = ? WHERE group_id = ? AND student_id = ?",
                )
                .bind(status.as_str())
                .bind(*join_date)
                .bind(group_id.0.to_string())
                .bind(student_id.0.to_string())
                .execute(&mut *tx)
                .await,
                MembershipChange::Remove { student_id } => {
                    sqlx::query("DELETE FROM memberships WHERE group_id = ? AND student_id = ?")
                        .bind(group_id.0.to_string())
                        .bind(student_id.0.to_string())
                        .execute(&mut *tx)
                        .await
                }
            };
            touched += result.map_err(backend)?.rows_affected();
        }

        let group = load_group_detail(&mut tx, group_id).await?;
        tx.commit().await.map_err(backend)?;
        Ok(AppliedChanges { touched, group })
    }

    // ───────────────────────────── Read models ─────────────────────────────

    async fn get_group_set_detail(
        &self,
        group_set_id: &GroupSetId,
    ) -> Result<GroupSetDetail, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let detail = load_group_set_detail(&mut tx, group_set_id).await?;
        tx.commit().await.map_err(backend)?;
        Ok(detail)
    }

    async fn list_group_set_details(
        &self,
        classroom_id: &ClassroomId,
    ) -> Result<Vec<GroupSetDetail>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let sets: Vec<GroupSet> = convert(
            sqlx::query_as::<_, GroupSetRow>(&format!(
                "SELECT {GROUP_SET_COLUMNS} FROM group_sets WHERE classroom_id = ? ORDER BY created_at, name"
            ))
            .bind(classroom_id.0.to_string())
            .fetch_all(&mut *tx)
            .await
            .map_err(backend)?,
        )?;

        let groups: Vec<Group> = convert(
            sqlx::query_as::<_, GroupRow>(
                "SELECT g.id, g.group_set_id, g.name, g.max_members, g.image, g.position, g.created_at, g.updated_at
                 FROM student_groups g
                 JOIN group_sets s ON s.id = g.group_set_id
                 WHERE s.classroom_id = ?",
            )
            .bind(classroom_id.0.to_string())
            .fetch_all(&mut *tx)
            .await
            .map_err(backend)?,
        )?;

        let memberships: Vec<Membership> = convert(
            sqlx::query_as::<_, MembershipRow>(
                "SELECT m.group_id, m.student_id, m.status, m.join_date, m.requested_at
                 FROM memberships m
                 JOIN student_groups g ON g.id = m.group_id
                 JOIN group_sets s ON s.id = g.group_set_id
                 WHERE s.classroom_id = ?",
            )
            .bind(classroom_id.0.to_string())
            .fetch_all(&mut *tx)
            .await
            .map_err(backend)?,
        )?;

        let roster = fetch_roster(&mut tx, classroom_id).await?;
        tx.commit().await.map_err(backend)?;

        Ok(sets
            .into_iter()
            .map(|set| {
                let set_groups = groups
                    .iter()
                    .filter(|g| g.group_set_id == set.id)
                    .cloned()
                    .collect();
                assemble_group_set(set, set_groups, &memberships, &roster)
            })
            .collect())
    }

    async fn get_group_detail(&self, group_id: &GroupId) -> Result<GroupDetail, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let detail = load_group_detail(&mut tx, group_id).await?;
        tx.commit().await.map_err(backend)?;
        Ok(detail)
    }
}

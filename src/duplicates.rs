use std::io::Write;

use log::{info, warn};
use rusqlite::Connection;

use crate::database::Database;
use crate::error::AdminError;
use crate::homestays::{ChildTable, DuplicateGroup, Homestay};
use crate::owners::Owner;

/// How the operator named the owner whose homestays are merged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnerSelector {
    Id(i64),
    Username(String),
}

/// Comma separated homestay ids as given on the command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdList(pub Vec<i64>);

/// Parses `"3, 5,,7"` into `[3, 5, 7]`. Blank entries are skipped; anything else that
/// is not an integer is rejected.
pub fn parse_id_list(s: &str) -> Result<IdList, String> {
    s.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|_| format!("invalid homestay id '{}'", token))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(IdList)
}

#[derive(Clone, Debug)]
pub struct MergeRequest {
    pub owner: Option<OwnerSelector>,
    pub keep_id: Option<i64>,
    pub delete_ids: Vec<i64>,
    pub dry_run: bool,
    pub confirm: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChildCounts {
    pub rooms: usize,
    pub bookings: usize,
    pub features: usize,
}

impl ChildCounts {
    fn collect(conn: &Connection, homestay_ids: &[i64]) -> Result<Self, AdminError> {
        Ok(ChildCounts {
            rooms: ChildTable::Rooms.count_for(conn, homestay_ids)?,
            bookings: ChildTable::Bookings.count_for(conn, homestay_ids)?,
            features: ChildTable::Features.count_for(conn, homestay_ids)?,
        })
    }

    fn get(&self, table: ChildTable) -> usize {
        match table {
            ChildTable::Rooms => self.rooms,
            ChildTable::Bookings => self.bookings,
            ChildTable::Features => self.features,
        }
    }

    fn total(&self) -> usize {
        self.rooms + self.bookings + self.features
    }
}

/// Everything decided before the first write.
#[derive(Clone, Debug)]
pub struct MergePlan {
    owner: Owner,
    homestays: Vec<Homestay>,
    keep_id: i64,
    keep_defaulted: bool,
    delete_ids: Vec<i64>,
    ignored_ids: Vec<i64>,
    pending: ChildCounts,
}

impl MergePlan {
    pub fn keep_id(&self) -> i64 {
        self.keep_id
    }

    pub fn delete_ids(&self) -> &[i64] {
        &self.delete_ids
    }

    pub fn ignored_ids(&self) -> &[i64] {
        &self.ignored_ids
    }

    pub fn pending(&self) -> ChildCounts {
        self.pending
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeSummary {
    pub moved: ChildCounts,
    pub homestays_deleted: usize,
    /// Homestay rows plus child rows removed by cascade
    pub rows_deleted: usize,
}

#[derive(Clone, Debug)]
pub enum MergeOutcome {
    NothingToMerge,
    NothingSelected,
    DryRun(MergePlan),
    Merged(MergePlan, MergeSummary),
}

pub struct Duplicates;

impl Duplicates {
    /// Writes every owner with more than one homestay as a pretty JSON array.
    pub fn list<W: Write>(conn: &Connection, out: &mut W) -> Result<Vec<DuplicateGroup>, AdminError> {
        let groups = Homestay::duplicate_groups(conn)?;
        info!("Found {} owners with duplicate homestays", groups.len());

        let json = serde_json::to_string_pretty(&groups)?;
        writeln!(out, "{}", json)?;

        Ok(groups)
    }

    /// Plans, reports and (with `confirm`) applies a merge for one owner.
    ///
    /// The plan is written to `out` before the confirmation check so that an operator
    /// who forgot `--confirm` still sees what would have happened.
    pub fn merge<W: Write>(
        db: &mut Database,
        request: &MergeRequest,
        out: &mut W,
    ) -> Result<MergeOutcome, AdminError> {
        let owner = Self::resolve_owner(db.conn(), request.owner.as_ref())?;

        let homestays = Homestay::for_owner(db.conn(), owner.id())?;
        if homestays.len() <= 1 {
            writeln!(out, "Owner has 0 or 1 homestay; nothing to merge.")?;
            return Ok(MergeOutcome::NothingToMerge);
        }

        writeln!(
            out,
            "Found {} homestays for owner {} (id={}):",
            homestays.len(),
            owner.username(),
            owner.id()
        )?;
        for h in &homestays {
            writeln!(out, "  id={} name={:?} address={:?}", h.id(), h.name(), h.address())?;
        }

        let plan = Self::plan(db.conn(), owner, homestays, request)?;

        if plan.keep_defaulted {
            writeln!(out, "No --keep-id provided: defaulting to keep id={}", plan.keep_id)?;
        }

        if plan.delete_ids.is_empty() {
            writeln!(out, "No homestays selected for deletion after filtering; aborting.")?;
            return Ok(MergeOutcome::NothingSelected);
        }

        Self::write_plan(&plan, out)?;

        if request.dry_run {
            writeln!(out, "\nDry-run mode: no changes performed. Add --confirm to execute.")?;
            return Ok(MergeOutcome::DryRun(plan));
        }

        if !request.confirm {
            return Err(AdminError::user_input(
                "Destructive action requires --confirm. Add --confirm to actually perform the merge.",
            ));
        }

        let summary = Self::execute(db, &plan)?;

        writeln!(out, "\nMerge complete:")?;
        for table in ChildTable::ALL {
            writeln!(out, "  {} moved: {}", table.label(), summary.moved.get(table))?;
        }
        writeln!(
            out,
            "  Homestay rows deleted (including cascades): {}",
            summary.rows_deleted
        )?;

        Ok(MergeOutcome::Merged(plan, summary))
    }

    fn resolve_owner(conn: &Connection, selector: Option<&OwnerSelector>) -> Result<Owner, AdminError> {
        let owner = match selector {
            Some(OwnerSelector::Id(id)) => Owner::get_by_id(conn, *id)?,
            Some(OwnerSelector::Username(username)) => Owner::get_by_username(conn, username)?,
            None => None,
        };

        owner.ok_or_else(|| {
            AdminError::user_input(
                "Owner not specified or not found. Use --list to see duplicates, or supply --owner-id/--owner-username",
            )
        })
    }

    fn plan(
        conn: &Connection,
        owner: Owner,
        homestays: Vec<Homestay>,
        request: &MergeRequest,
    ) -> Result<MergePlan, AdminError> {
        let (keep_id, keep_defaulted) = match request.keep_id {
            Some(keep_id) => {
                if Homestay::get_for_owner(conn, keep_id, owner.id())?.is_none() {
                    return Err(AdminError::user_input(format!(
                        "keep-id {} not found for this owner",
                        keep_id
                    )));
                }
                (keep_id, false)
            }
            // Lowest id wins; homestays are ordered by id
            None => (homestays[0].id(), true),
        };

        let owned: Vec<i64> = homestays.iter().map(Homestay::id).collect();
        let (delete_ids, ignored_ids) = select_delete_ids(&owned, keep_id, &request.delete_ids);
        for id in &ignored_ids {
            warn!(
                "Ignoring delete id {}: it is the keep id or not owned by {}",
                id,
                owner.username()
            );
        }

        let pending = ChildCounts::collect(conn, &delete_ids)?;

        Ok(MergePlan {
            owner,
            homestays,
            keep_id,
            keep_defaulted,
            delete_ids,
            ignored_ids,
            pending,
        })
    }

    fn write_plan<W: Write>(plan: &MergePlan, out: &mut W) -> Result<(), AdminError> {
        writeln!(out, "\nPlanned actions:")?;
        writeln!(out, "  Keep homestay id={}", plan.keep_id())?;
        writeln!(out, "  Delete homestay ids={:?}", plan.delete_ids())?;
        if !plan.ignored_ids().is_empty() {
            writeln!(out, "  Ignored delete ids={:?}", plan.ignored_ids())?;
        }
        let pending = plan.pending();
        for table in ChildTable::ALL {
            writeln!(out, "  {} to reassign: {}", table.label(), pending.get(table))?;
        }
        Ok(())
    }

    fn execute(db: &mut Database, plan: &MergePlan) -> Result<MergeSummary, AdminError> {
        info!(
            "Merging homestays {:?} into {} for owner {} ({} listings before merge)",
            plan.delete_ids,
            plan.keep_id,
            plan.owner.id(),
            plan.homestays.len()
        );

        let summary = db.immediate_transaction(|tx| {
            let keep = Homestay::lock(tx, plan.keep_id)?;
            if keep.owner_id() != plan.owner.id() {
                return Err(AdminError::Error(format!(
                    "Homestay id={} changed owner before merge",
                    keep.id()
                )));
            }

            let moved = ChildCounts {
                rooms: ChildTable::Rooms.reassign(tx, &plan.delete_ids, keep.id())?,
                bookings: ChildTable::Bookings.reassign(tx, &plan.delete_ids, keep.id())?,
                features: ChildTable::Features.reassign(tx, &plan.delete_ids, keep.id())?,
            };

            // Whatever still points at the retired rows goes with them
            let cascaded = ChildCounts::collect(tx, &plan.delete_ids)?.total();
            let homestays_deleted = Homestay::delete_many(tx, &plan.delete_ids)?;

            Ok(MergeSummary {
                moved,
                homestays_deleted,
                rows_deleted: homestays_deleted + cascaded,
            })
        })?;

        info!(
            "Merge committed: {} rooms, {} bookings, {} features moved; {} homestays deleted",
            summary.moved.rooms,
            summary.moved.bookings,
            summary.moved.features,
            summary.homestays_deleted
        );

        Ok(summary)
    }
}

/// Splits the requested ids into those that will be deleted and those that are
/// ignored. An empty request means every owned id except `keep_id`.
///
/// Ids that are the keep id or not in `owned` are dropped rather than rejected.
/// Repeats collapse to their first occurrence.
pub fn select_delete_ids(owned: &[i64], keep_id: i64, requested: &[i64]) -> (Vec<i64>, Vec<i64>) {
    if requested.is_empty() {
        let selected = owned.iter().copied().filter(|id| *id != keep_id).collect();
        return (selected, Vec::new());
    }

    let mut selected = Vec::new();
    let mut ignored = Vec::new();
    for &id in requested {
        if id != keep_id && owned.contains(&id) {
            if !selected.contains(&id) {
                selected.push(id);
            }
        } else if !ignored.contains(&id) {
            ignored.push(id);
        }
    }

    (selected, ignored)
}

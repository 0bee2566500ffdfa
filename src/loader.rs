//! VRM/GLB avatar loading using the `gltf` crate.
//!
//! Only the node hierarchy with rest transforms, the skin joint set and the
//! face mesh morph target names are extracted. No geometry is decoded.

use glam::{Quat, Vec3};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use crate::error::LoadError;
use crate::skeleton::{MorphTargets, Rig};

const READ_CHUNK: usize = 64 * 1024;

/// Progress and outcome of a background load.
#[derive(Debug)]
pub enum LoadEvent {
    /// Percent of the file read so far
    Progress(f32),
    Loaded(Rig),
    Failed(LoadError),
}

/// Start loading `path` in the background.
///
/// The receiver yields progress events followed by exactly one terminal
/// `Loaded` or `Failed` event.
pub fn spawn_load(path: impl Into<PathBuf>) -> mpsc::Receiver<LoadEvent> {
    let path = path.into();
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let bytes = match read_with_progress(&path, &tx).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx.send(LoadEvent::Failed(e)).await;
                return;
            }
        };

        let parsed = tokio::task::spawn_blocking(move || load_rig_from_slice(&bytes)).await;
        let event = match parsed {
            Ok(Ok(rig)) => LoadEvent::Loaded(rig),
            Ok(Err(e)) => LoadEvent::Failed(e),
            Err(e) => LoadEvent::Failed(LoadError::Parse(format!("loader task failed: {}", e))),
        };
        let _ = tx.send(event).await;
    });

    rx
}

async fn read_with_progress(
    path: &Path,
    tx: &mpsc::Sender<LoadEvent>,
) -> Result<Vec<u8>, LoadError> {
    let read_err = |e: std::io::Error| LoadError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut file = tokio::fs::File::open(path).await.map_err(read_err)?;
    let total = file.metadata().await.map_err(read_err)?.len() as usize;

    let mut bytes = Vec::with_capacity(total);
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut last_percent = -1.0f32;

    loop {
        let n = file.read(&mut chunk).await.map_err(read_err)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);

        if total > 0 {
            let percent = ((bytes.len() as f32 / total as f32) * 100.0).min(100.0).floor();
            if percent > last_percent {
                last_percent = percent;
                let _ = tx.send(LoadEvent::Progress(percent)).await;
            }
        }
    }

    Ok(bytes)
}

/// Build a rig from GLB or glTF JSON bytes.
///
/// Node indices map one-to-one onto [`crate::skeleton::JointId`]s. Nodes
/// referenced by any skin are marked as joints.
pub fn load_rig_from_slice(bytes: &[u8]) -> Result<Rig, LoadError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| LoadError::Parse(e.to_string()))?;
    let document = &gltf.document;

    let joint_nodes: HashSet<usize> = document
        .skins()
        .flat_map(|skin| skin.joints().map(|j| j.index()).collect::<Vec<_>>())
        .collect();
    if joint_nodes.is_empty() {
        return Err(LoadError::NoSkeleton);
    }

    // One rig node per document node, same index order
    let mut rig = Rig::new();
    let ids: Vec<_> = document
        .nodes()
        .map(|node| {
            let id = rig.add_node(node.name().unwrap_or(""), joint_nodes.contains(&node.index()));
            let (t, r, s) = node.transform().decomposed();
            let joint = rig.joint_mut(id);
            joint.set_translation(Vec3::from(t));
            joint.set_rotation(Quat::from_array(r));
            joint.set_scale(Vec3::from(s));
            id
        })
        .collect();

    // Link the hierarchy once every node exists
    for node in document.nodes() {
        for child in node.children() {
            rig.set_parent(ids[child.index()], ids[node.index()]);
        }
    }

    if let Some(face) = face_morph_targets(document) {
        tracing::info!(
            "Face mesh {:?}: {} morph targets",
            face.mesh_name(),
            face.len()
        );
        rig.set_face(face);
    } else {
        tracing::warn!("No mesh with morph targets found");
    }

    tracing::info!(
        "Loaded rig: {} nodes, {} joints",
        rig.len(),
        rig.joint_count()
    );
    Ok(rig)
}

/// The face mesh is the mesh with the most morph targets.
fn face_morph_targets(document: &gltf::Document) -> Option<MorphTargets> {
    let (mesh, count) = document
        .meshes()
        .filter_map(|m| {
            let count = m
                .primitives()
                .next()
                .map(|p| p.morph_targets().count())
                .unwrap_or(0);
            (count > 0).then_some((m, count))
        })
        .max_by_key(|(_, count)| *count)?;

    let mut names = parse_morph_target_names(&mesh);
    if names.len() != count {
        tracing::debug!(
            "Mesh {:?} has {} targets but {} names, using indices",
            mesh.name(),
            count,
            names.len()
        );
        names = (0..count).map(|i| i.to_string()).collect();
    }

    let mut face = MorphTargets::new(mesh.name().unwrap_or("face"), names);
    if let Some(weights) = mesh.weights() {
        for (i, &w) in weights.iter().enumerate().take(count) {
            face.set_weight_at(i, w);
        }
    }
    Some(face)
}

/// Morph target names from mesh extras, shared prefix stripped.
fn parse_morph_target_names(mesh: &gltf::Mesh) -> Vec<String> {
    let Some(extras) = mesh.extras().as_ref() else {
        return Vec::new();
    };
    let Ok(val) = serde_json::from_str::<serde_json::Value>(extras.get()) else {
        return Vec::new();
    };
    match val.get("targetNames").and_then(|v| v.as_array()) {
        Some(names) => strip_morph_prefixes(
            names
                .iter()
                .filter_map(|n| n.as_str().map(String::from))
                .collect(),
        ),
        None => Vec::new(),
    }
}

/// Strip a `<prefix>.` shared by every name, as in `"Face.Fcl_MTH_A"`.
/// Names without a common prefix are returned as-is.
fn strip_morph_prefixes(names: Vec<String>) -> Vec<String> {
    if names.len() < 2 {
        return names;
    }

    // Find the first dot-prefix
    let Some(dot) = names[0].find('.') else {
        return names;
    };
    let prefix = names[0][..=dot].to_string();

    // Check all names share this prefix
    if !names.iter().all(|n| n.starts_with(&prefix)) {
        return names;
    }

    names
        .into_iter()
        .map(|n| n[prefix.len()..].to_string())
        .collect()
}

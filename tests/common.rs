#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use ai::model::{GenerationProfile, ModelClient};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tempfile::TempDir;

pub struct TestRepo {
  pub repo:      git2::Repository,
  pub repo_path: TempDir
}

impl Default for TestRepo {
  fn default() -> Self {
    let repo_path = TempDir::new().unwrap();
    let repo = git2::Repository::init(repo_path.path()).unwrap();
    Self { repo, repo_path }
  }
}

impl TestRepo {
  pub fn path(&self) -> &Path {
    self.repo_path.path()
  }

  pub fn write(&self, name: &str, content: &str) -> Result<()> {
    let file_path = self.path().join(name);
    if let Some(parent) = file_path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
  }

  pub fn remove(&self, name: &str) -> Result<()> {
    std::fs::remove_file(self.path().join(name))?;
    Ok(())
  }

  /// Stages `name`, or its removal when the file no longer exists.
  pub fn stage(&self, name: &str) -> Result<()> {
    let mut index = self.repo.index()?;
    if self.path().join(name).exists() {
      index.add_path(Path::new(name))?;
    } else {
      index.remove_path(Path::new(name))?;
    }
    index.write()?;
    Ok(())
  }

  pub fn commit(&self, message: &str) -> Result<()> {
    let mut index = self.repo.index()?;
    let oid = index.write_tree()?;
    let signature = git2::Signature::now("Your Name", "email@example.com")?;
    let tree = self.repo.find_tree(oid)?;

    match self.repo.head().ok().and_then(|head| head.peel_to_commit().ok()) {
      Some(parent) => self.repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])?,
      None => self.repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &[])?
    };

    Ok(())
  }
}

/// One scripted answer of [`ScriptedClient`].
#[derive(Debug, Clone)]
pub enum Reply {
  Text(String),
  Fail(String),
  /// Never answers; exercises the per-call timeout.
  Hang
}

impl Reply {
  pub fn text(text: &str) -> Self {
    Reply::Text(text.to_string())
  }

  pub fn fail(reason: &str) -> Self {
    Reply::Fail(reason.to_string())
  }
}

#[derive(Debug, Clone)]
pub struct Call {
  pub model:   String,
  pub prompt:  String,
  pub profile: GenerationProfile
}

/// Model client replaying a fixed script; fails once the script runs out.
#[derive(Default)]
pub struct ScriptedClient {
  replies: Mutex<VecDeque<Reply>>,
  calls:   Mutex<Vec<Call>>
}

impl ScriptedClient {
  pub fn new(replies: Vec<Reply>) -> Self {
    Self { replies: Mutex::new(replies.into()), calls: Mutex::new(Vec::new()) }
  }

  /// A client whose every call fails like an unreachable server.
  pub fn unreachable() -> Self {
    Self::new(Vec::new())
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl ModelClient for ScriptedClient {
  async fn generate(&self, model: &str, prompt: &str, profile: &GenerationProfile) -> Result<String> {
    self.calls.lock().unwrap().push(Call {
      model:   model.to_string(),
      prompt:  prompt.to_string(),
      profile: profile.clone()
    });

    let reply = self.replies.lock().unwrap().pop_front();
    match reply {
      Some(Reply::Text(text)) => Ok(text),
      Some(Reply::Fail(reason)) => Err(anyhow!(reason)),
      Some(Reply::Hang) => {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(anyhow!("hung call returned"))
      }
      None => Err(anyhow!("error sending request: Connection refused (os error 111)"))
    }
  }

  fn name(&self) -> &str {
    "scripted"
  }
}

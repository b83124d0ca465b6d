//! Test fixtures: real OpenSSH key pairs and scripted stand-ins for the
//! terminal, the editor and ssh-keygen

use anyhow::Result;
use secrets_core::{Confirm, Editor, KeyGenerator, SecretsPaths};
use std::fs;
use std::path::Path;

#[derive(Clone, Copy)]
pub(crate) struct KeyPair {
    pub private: &'static str,
    pub public: &'static str,
}

/// ssh-ed25519, comment ops@alpha
pub(crate) const ALPHA: KeyPair = KeyPair {
    private: include_str!("../testdata/alpha"),
    public: include_str!("../testdata/alpha.pub"),
};

/// ssh-ed25519, comment ops@alpha (a newer key for the same host)
pub(crate) const ALPHA_ROTATED: KeyPair = KeyPair {
    private: include_str!("../testdata/alpha_rotated"),
    public: include_str!("../testdata/alpha_rotated.pub"),
};

/// ssh-ed25519, comment ops@beta
pub(crate) const BETA: KeyPair = KeyPair {
    private: include_str!("../testdata/beta"),
    public: include_str!("../testdata/beta.pub"),
};

/// ssh-rsa 2048, comment ops@gamma
pub(crate) const GAMMA: KeyPair = KeyPair {
    private: include_str!("../testdata/gamma"),
    public: include_str!("../testdata/gamma.pub"),
};

/// ecdsa-sha2-nistp256 public key, which age cannot encrypt to
pub(crate) const DELTA_PUB: &str = include_str!("../testdata/delta.pub");

/// Paths for host `name`: a shared secrets directory under `root` and a
/// per-host identity, installed from `key` when given
pub(crate) fn host(root: &Path, name: &str, key: Option<KeyPair>) -> SecretsPaths {
    let identity = SecretsPaths::default_identity(&root.join(name));
    let paths = SecretsPaths::new(&root.join("shared"), &identity);
    if let Some(key) = key {
        install(&paths, key);
    }
    paths
}

pub(crate) fn install(paths: &SecretsPaths, key: KeyPair) {
    fs::create_dir_all(paths.identity.parent().unwrap()).unwrap();
    fs::write(&paths.identity, key.private).unwrap();
    fs::write(&paths.public_key, key.public).unwrap();
}

/// Answers every question the same way and records what was asked
pub(crate) struct Answer {
    reply: bool,
    pub asked: Vec<String>,
}

impl Answer {
    pub fn yes() -> Self {
        Self {
            reply: true,
            asked: Vec::new(),
        }
    }

    pub fn no() -> Self {
        Self {
            reply: false,
            asked: Vec::new(),
        }
    }
}

impl Confirm for Answer {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.asked.push(question.to_string());
        Ok(self.reply)
    }
}

/// Editor stand-in that runs a closure against the working file
pub(crate) struct ScriptedEditor<F>(pub F);

impl<F> Editor for ScriptedEditor<F>
where
    F: Fn(&Path) -> Result<()>,
{
    fn edit(&self, path: &Path) -> Result<()> {
        (self.0)(path)
    }
}

/// Editor stand-in that replaces the working file with fixed content
pub(crate) fn writes(content: &'static str) -> ScriptedEditor<impl Fn(&Path) -> Result<()>> {
    ScriptedEditor(move |path: &Path| {
        fs::write(path, content)?;
        Ok(())
    })
}

/// Editor stand-in that leaves the file untouched
pub(crate) fn untouched() -> ScriptedEditor<impl Fn(&Path) -> Result<()>> {
    ScriptedEditor(|_: &Path| Ok(()))
}

/// Key generator that installs a fixture instead of running ssh-keygen
pub(crate) struct FixtureKeygen(pub KeyPair);

impl KeyGenerator for FixtureKeygen {
    fn generate(&self, private_key: &Path) -> Result<()> {
        fs::create_dir_all(private_key.parent().unwrap())?;
        fs::write(private_key, self.0.private)?;
        fs::write(format!("{}.pub", private_key.display()), self.0.public)?;
        Ok(())
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart-script writer. Called on the DRAINED -> CHECKPOINTED edge.
//!
//! The header, `check_local` helper, usage text, and multi-host
//! `worker_ckpts=` record syntax are transcribed from the original
//! coordinator's literal shell templates (see DESIGN.md); only the
//! surrounding Rust plumbing (path construction, permission bits, the
//! symlink swap) is this reimplementation's own.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use dmtcp_core::Clock;

use crate::coordinator::Coordinator;
use crate::error::CoordinatorError;

const RESTART_SCRIPT_BASENAME: &str = "dmtcp_restart_script";
const RESTART_SCRIPT_EXT: &str = ".sh";
const DMTCP_RESTART_CMD: &str = "dmtcp_restart";

const HEADER: &str = "\
#!/bin/bash

set -m # turn on job control

#This script launches all the restarts in the background.
#Suggestions for editing:
#  1. For those processes executing on the localhost, remove
#     'ssh <hostname> from the start of the line.
#  2. If using ssh, verify that ssh does not require passwords or other
#     prompts.
#  3. Verify that the dmtcp_restart command is in your path on all hosts,
#     otherwise set the remote_prefix appropriately.
#  4. Verify DMTCP_HOST and DMTCP_PORT match the location of the
#     dmtcp_coordinator. If necessary, add
#     'DMTCP_PORT=<dmtcp_coordinator port>' after 'DMTCP_HOST=<...>'.
#  5. Remove the '&' from a line if that process reads STDIN.
#     If multiple processes read STDIN then prefix the line with
#     'xterm -hold -e' and put '&' at the end of the line.
#  6. Processes on same host can be restarted with single dmtcp_restart
#     command.


";

const CHECK_LOCAL: &str = "\
check_local()
{
  worker_host=$1
  unset is_local_node
  worker_ip=$(nslookup $worker_host | grep -A1 'Name:' | grep 'Address:' | sed -e 's/Address://' -e 's/ //' -e 's/\t//')
  ifconfig_path=`which ifconfig`
  if [ -z \"$ifconfig_path\" ]; then
    ifconfig_path=\"/sbin/ifconfig\"
  fi
  output=`$ifconfig_path -a | grep \"inet addr:.*${worker_ip}.*Bcast\"`
  if [ -n \"$output\" ]; then
    is_local_node=1
  else
    is_local_node=0
  fi
}


";

const USAGE: &str = "\
usage_str='USAGE:
  dmtcp_restart_script.sh [OPTIONS]

OPTIONS:
  --host, -h, (environment variable DMTCP_HOST):
      Hostname where dmtcp_coordinator is running
  --port, -p, (environment variable DMTCP_PORT):
      Port where dmtcp_coordinator is running
  --hostfile <arg0> :
      Provide a hostfile (One host per line, \"#\" indicates comments)
  --restartdir, -d, (environment variable DMTCP_RESTART_DIR):
      Directory to read checkpoint images from
  --batch, -b:
      Enable batch mode for dmtcp_restart
  --disable-batch, -b:
      Disable batch mode for dmtcp_restart (if previously enabled)
  --interval, -i, (environment variable DMTCP_CHECKPOINT_INTERVAL):
      Time in seconds between automatic checkpoints
      (Default: Use pre-checkpoint value)
  --help:
      Print this message and exit.'


";

const CMDLINE_ARG_HANDLER: &str = "\
if [ $# -gt 0 ]; then
  while [ $# -gt 0 ]
  do
    if [ $1 = \"--help\" ]; then
      echo \"$usage_str\"
      exit
    elif [ $1 = \"--batch\" -o $1 = \"-b\" ]; then
      maybebatch='--batch'
      shift
    elif [ $1 = \"--disable-batch\" ]; then
      maybebatch=
      shift
    elif [ $# -ge 2 ]; then
      case \"$1\" in
        --host|-h)
          coord_host=\"$2\";;
        --port|-p)
          coord_port=\"$2\";;
        --hostfile)
          hostfile=\"$2\"
          if [ ! -f \"$hostfile\" ]; then
            echo \"ERROR: hostfile $hostfile not found\"
            exit
          fi;;
        --restartdir|-d)
          DMTCP_RESTART_DIR=$2;;
        --interval|-i)
          checkpoint_interval=$2;;
        *)
          echo \"$0: unrecognized option '$1'. See correct usage below\"
          echo \"$usage_str\"
          exit;;
      esac
      shift
      shift
    elif [ $1 = \"--help\" ]; then
      echo \"$usage_str\"
      exit
    else
      echo \"$0: Incorrect usage.  See correct usage below\"
      echo
      echo \"$usage_str\"
      exit
    fi
  done
fi

";

const SINGLE_HOST_PROCESSING: &str = "\
ckpt_files=\"\"
if [ ! -z \"$DMTCP_RESTART_DIR\" ]; then
  for tmp in $given_ckpt_files; do
    ckpt_files=\"$DMTCP_RESTART_DIR/$(basename $tmp) $ckpt_files\"
  done
else
  ckpt_files=$given_ckpt_files
fi

coordinator_info=
if [ -z \"$maybebatch\" ]; then
  coordinator_info=\"--host $coord_host --port $coord_port\"
fi

exec $dmt_rstr_cmd $coordinator_info\\
  $maybebatch $maybejoin --interval \"$checkpoint_interval\"\\
  $ckpt_files
";

const MULTI_HOST_PROCESSING: &str = "\
worker_ckpts_regexp=\\
'[^:]*::[ \\t\\n]*\\([^ \\t\\n]\\+\\)[ \\t\\n]*:\\([a-z]\\+\\):[ \\t\\n]*\\([^:]\\+\\)'

worker_hosts=$(\\
  echo $worker_ckpts | sed -e 's/'\"$worker_ckpts_regexp\"'/\\1 /g')
restart_modes=$(\\
  echo $worker_ckpts | sed -e 's/'\"$worker_ckpts_regexp\"'/: \\2/g')
ckpt_files_groups=$(\\
  echo $worker_ckpts | sed -e 's/'\"$worker_ckpts_regexp\"'/: \\3/g')

if [ ! -z \"$hostfile\" ]; then
  worker_hosts=$(\\
    cat \"$hostfile\" | sed -e 's/#.*//' -e 's/[ \\t\\r]*//' -e '/^$/ d')
fi

localhost_ckpt_files_group=

num_worker_hosts=$(echo $worker_hosts | wc -w)

maybejoin=
if [ \"$num_worker_hosts\" != \"1\" ]; then
  maybejoin='--join'
fi

for worker_host in $worker_hosts
do

  ckpt_files_group=$(\\
    echo $ckpt_files_groups | sed -e 's/[^:]*:[ \\t\\n]*\\([^:]*\\).*/\\1/')
  ckpt_files_groups=$(echo $ckpt_files_groups | sed -e 's/[^:]*:[^:]*//')

  mode=$(echo $restart_modes | sed -e 's/[^:]*:[ \\t\\n]*\\([^:]*\\).*/\\1/')
  restart_modes=$(echo $restart_modes | sed -e 's/[^:]*:[^:]*//')

  maybexterm=
  maybebg=
  case $mode in
    bg) maybebg='bg';;
    xterm) maybexterm=xterm;;
    fg) ;;
    *) echo \"WARNING: Unknown Mode\";;
  esac

  if [ -z \"$ckpt_files_group\" ]; then
    break;
  fi

  new_ckpt_files_group=\"\"
  for tmp in $ckpt_files_group
  do
      if  [ ! -z \"$DMTCP_RESTART_DIR\" ]; then
        tmp=$DMTCP_RESTART_DIR/$(basename $tmp)
      fi
      new_ckpt_files_group=\"$new_ckpt_files_group $tmp\"
  done

  check_local $worker_host
  if [ \"$is_local_node\" -eq 1 -o \"$num_worker_hosts\" == \"1\" ]; then
    localhost_ckpt_files_group=\"$new_ckpt_files_group\"
    continue
  fi

  if [ -z $maybebg ]; then
    $maybexterm /usr/bin/ssh -t \"$worker_host\" \\
      $remote_dmt_rstr_cmd --host \"$coord_host\" --port \"$coord_port\"\\
      $maybebatch --join --interval \"$checkpoint_interval\"\\
      $new_ckpt_files_group
  else
    $maybexterm /usr/bin/ssh \"$worker_host\" \\
      \"/bin/sh -c '$remote_dmt_rstr_cmd --host $coord_host --port $coord_port\\
      $maybebatch --join --interval \"$checkpoint_interval\"\\
      $new_ckpt_files_group'\" &
  fi

done

if [ -n \"$localhost_ckpt_files_group\" ]; then
exec $dmt_rstr_cmd --host \"$coord_host\" --port \"$coord_port\" $maybebatch\\
  $maybejoin --interval \"$checkpoint_interval\" $localhost_ckpt_files_group
fi

#wait for them all to finish
wait
";

fn unique_filename<C: Clock>(coord: &Coordinator<C>) -> PathBuf {
    let generation = coord.computation_id.generation();
    coord.options.checkpoint_dir.join(format!(
        "{RESTART_SCRIPT_BASENAME}_{}_{generation:05}{RESTART_SCRIPT_EXT}",
        coord.computation_id
    ))
}

fn symlink_path<C: Clock>(coord: &Coordinator<C>) -> PathBuf {
    coord.options.checkpoint_dir.join(format!("{RESTART_SCRIPT_BASENAME}{RESTART_SCRIPT_EXT}"))
}

/// Writes the unique restart script and re-points the stable
/// `dmtcp_restart_script.sh` symlink at it.
pub fn write<C: Clock>(coord: &Coordinator<C>) -> Result<(), CoordinatorError> {
    let unique_path = unique_filename(coord);
    let symlink_target = symlink_path(coord);

    let mut body = String::new();
    body.push_str(HEADER);
    body.push_str(CHECK_LOCAL);
    body.push_str(USAGE);

    body.push_str(&format!(
        "coord_host=$DMTCP_HOST\n\
         if test -z \"$DMTCP_HOST\"; then\n\
         \u{20}\u{20}coord_host={}\nfi\n\n\
         coord_port=$DMTCP_PORT\n\
         if test -z \"$DMTCP_PORT\"; then\n\
         \u{20}\u{20}coord_port={}\nfi\n\n\
         checkpoint_interval=$DMTCP_CHECKPOINT_INTERVAL\n\
         if test -z \"$DMTCP_CHECKPOINT_INTERVAL\"; then\n\
         \u{20}\u{20}checkpoint_interval={}\nfi\n\n",
        crate::env::coordinator_host(),
        coord.options.port,
        coord.checkpoint_interval_seconds,
    ));

    body.push_str(if coord.options.batch { "maybebatch='--batch'\n\n" } else { "maybebatch=\n\n" });
    body.push_str(CMDLINE_ARG_HANDLER);

    body.push_str(&format!(
        "dmt_rstr_cmd={DMTCP_RESTART_CMD}\n\
         which {DMTCP_RESTART_CMD} > /dev/null \\\n\
         \u{20}|| dmt_rstr_cmd=$(dirname $0)/{DMTCP_RESTART_CMD}\n\n"
    ));

    body.push_str(&format!("local_prefix={}\n", coord.local_prefix.as_deref().unwrap_or("")));
    body.push_str(&format!("remote_prefix={}\n", coord.remote_prefix.as_deref().unwrap_or("")));
    body.push_str(&format!(
        "remote_dmt_rstr_cmd={DMTCP_RESTART_CMD}\n\
         if ! test -z \"$remote_prefix\"; then\n\
         \u{20}\u{20}remote_dmt_rstr_cmd=\"$remote_prefix/bin/{DMTCP_RESTART_CMD}\"\n\
         fi\n\n"
    ));

    body.push_str(&format!(
        "# Number of hosts in the computation = {}\n# Number of processes in the computation = {}\n\n",
        coord.restart_filenames.len(),
        coord.num_peers.max(coord.registry.len() as u32),
    ));

    if coord.restart_filenames.len() == 1 {
        let files: Vec<&str> =
            coord.restart_filenames.values().next().map(|v| v.iter().map(String::as_str).collect()).unwrap_or_default();
        body.push_str(&format!("given_ckpt_files=\"{}\"\n\n", files.join(" ")));
        body.push_str(SINGLE_HOST_PROCESSING);
    } else {
        body.push_str(
            "# SYNTAX:\n\
             #  :: <HOST> :<MODE>: <CHECKPOINT_IMAGE> ...\n\
             # Host names and filenames must not include ':'\n\
             # At most one fg (foreground) mode allowed; it must be last.\n\
             # 'maybexterm' and 'maybebg' are set from <MODE>.\n",
        );

        body.push_str("worker_ckpts='");
        let mut hosts: Vec<&String> = coord.restart_filenames.keys().collect();
        hosts.sort();
        for host in hosts {
            let files = coord.restart_filenames.get(host).map(Vec::as_slice).unwrap_or_default();
            body.push_str(&format!("\n :: {host} :bg:"));
            for file in files {
                body.push_str(&format!(" {file}"));
            }
        }
        body.push_str("\n'\n\n");

        body.push_str(
            "# Check for resource manager\n\
             discover_rm_path=$(which dmtcp_discover_rm)\n\
             if [ -n \"$discover_rm_path\" ]; then\n\
             \u{20}\u{20}eval $(dmtcp_discover_rm \"$worker_ckpts\")\n\
             \u{20}\u{20}if [ -n \"$new_worker_ckpts\" ]; then\n\
             \u{20}\u{20}\u{20}\u{20}worker_ckpts=\"$new_worker_ckpts\"\n\
             \u{20}\u{20}fi\n\
             fi\n\n\n\n",
        );

        body.push_str(MULTI_HOST_PROCESSING);
    }

    fs::write(&unique_path, body).map_err(|source| CoordinatorError::RestartScriptWrite {
        path: unique_path.display().to_string(),
        source,
    })?;

    let mut perms =
        fs::metadata(&unique_path).map_err(CoordinatorError::Io)?.permissions();
    perms.set_mode(perms.mode() | 0o100);
    fs::set_permissions(&unique_path, perms).map_err(CoordinatorError::Io)?;

    let _ = fs::remove_file(&symlink_target);
    std::os::unix::fs::symlink(&unique_path, &symlink_target).map_err(CoordinatorError::Io)?;

    Ok(())
}

#[cfg(test)]
#[path = "restart_script_tests.rs"]
mod tests;
